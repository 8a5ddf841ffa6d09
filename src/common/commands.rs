/// Requests the session hands down to the channel pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Emit a `sendMessage` frame with this content.
    Send(String),
    /// Close the channel. Sent once per teardown.
    Close,
}
