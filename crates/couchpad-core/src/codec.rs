//! Space-joined text framing for the relay protocol.
//!
//! Wire format: `ACTION [arg ...]` — tokens joined by single spaces in a
//! newline-free UTF-8 text frame. There is no escaping: arguments must not
//! themselves contain the space character. An argument that does (say, a
//! username typed with a space) splits into extra tokens downstream rather
//! than being rejected here.

/// A decoded wire frame: an action token and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub action: String,
    pub args: Vec<String>,
}

impl Frame {
    /// Positional argument accessor.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Decode a raw text frame by splitting on single spaces.
///
/// The empty frame decodes to an empty action with no arguments.
/// Consecutive spaces yield empty argument tokens, exactly as the split
/// implies — the decoder does not normalize.
pub fn decode(raw: &str) -> Frame {
    let mut tokens = raw.split(' ');
    let action = tokens.next().unwrap_or_default().to_string();
    Frame {
        action,
        args: tokens.map(str::to_string).collect(),
    }
}

/// Encode an action and arguments by joining with single spaces.
pub fn encode(action: &str, args: &[&str]) -> String {
    if args.is_empty() {
        return action.to_string();
    }
    let mut out = String::with_capacity(
        action.len() + args.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    out.push_str(action);
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_action_and_args() {
        let frame = decode("JOIN_LOBBY abc123 alice");
        assert_eq!(frame.action, "JOIN_LOBBY");
        assert_eq!(frame.args, vec!["abc123", "alice"]);
        assert_eq!(frame.arg(0), Some("abc123"));
        assert_eq!(frame.arg(2), None);
    }

    #[test]
    fn decode_bare_action() {
        let frame = decode("LEAVE_LOBBY");
        assert_eq!(frame.action, "LEAVE_LOBBY");
        assert!(frame.args.is_empty());
    }

    #[test]
    fn decode_empty_frame() {
        let frame = decode("");
        assert_eq!(frame.action, "");
        assert!(frame.args.is_empty());
    }

    #[test]
    fn decode_keeps_empty_tokens_from_double_spaces() {
        let frame = decode("JOIN_LOBBY  alice");
        assert_eq!(frame.args, vec!["", "alice"]);
    }

    #[test]
    fn encode_joins_with_single_spaces() {
        assert_eq!(encode("JOIN_LOBBY", &["abc123", "alice"]), "JOIN_LOBBY abc123 alice");
        assert_eq!(encode("LEAVE_LOBBY_ACCEPT", &[]), "LEAVE_LOBBY_ACCEPT");
    }

    #[test]
    fn encode_decode_agree() {
        let raw = encode("PLAYER_DISCONNECT", &["p1"]);
        let frame = decode(&raw);
        assert_eq!(frame.action, "PLAYER_DISCONNECT");
        assert_eq!(frame.args, vec!["p1"]);
    }
}
