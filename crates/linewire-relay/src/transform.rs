use bytes::BytesMut;

/// Per-span payload transform applied between source and sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Forward bytes unchanged.
    #[default]
    Passthrough,
    /// ASCII-uppercase the span (the converter behavior).
    Uppercase,
}

impl Transform {
    /// Append the transformed span to `out`.
    pub fn apply(&self, span: &[u8], out: &mut BytesMut) {
        match self {
            Transform::Passthrough => out.extend_from_slice(span),
            Transform::Uppercase => out.extend(span.iter().map(|b| b.to_ascii_uppercase())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(transform: Transform, span: &[u8]) -> Vec<u8> {
        let mut out = BytesMut::new();
        transform.apply(span, &mut out);
        out.to_vec()
    }

    #[test]
    fn passthrough_is_identity() {
        assert_eq!(applied(Transform::Passthrough, b"Mixed 123\n"), b"Mixed 123\n");
    }

    #[test]
    fn uppercase_leaves_non_letters_alone() {
        assert_eq!(
            applied(Transform::Uppercase, b"abc XYZ 123!\n"),
            b"ABC XYZ 123!\n"
        );
    }

    #[test]
    fn apply_appends_rather_than_replaces() {
        let mut out = BytesMut::from(&b"prefix-"[..]);
        Transform::Uppercase.apply(b"tail", &mut out);
        assert_eq!(out.as_ref(), b"prefix-TAIL");
    }
}
