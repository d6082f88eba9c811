/// A single protocol command, as captured from the wire.
///
/// `expects_response` marks commands whose acknowledgement has to be read
/// (and discarded) before the next command may be sent; the device is one
/// stateful session and earlier exchanges bias how it interprets later ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    bytes: Vec<u8>,
    expects_response: bool,
}

impl Command {
    pub fn new(bytes: impl Into<Vec<u8>>, expects_response: bool) -> Self {
        Self {
            bytes: bytes.into(),
            expects_response,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn expects_response(&self) -> bool {
        self.expects_response
    }

    /// The command zero-padded to the transport frame size. The padding is
    /// pure filler, not protocol-significant.
    pub fn padded(&self, frame_size: usize) -> Vec<u8> {
        let mut frame = self.bytes.clone();
        if frame.len() < frame_size {
            frame.resize(frame_size, 0x00);
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_fills_with_trailing_zeroes() {
        let command = Command::new([0x06, 0xb0], true);
        let frame = command.padded(8);
        assert_eq!(frame, vec![0x06, 0xb0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn padding_never_truncates() {
        let command = Command::new([0x06, 0x33, 0x14, 0x14, 0x14], false);
        assert_eq!(command.padded(3), vec![0x06, 0x33, 0x14, 0x14, 0x14]);
    }
}
