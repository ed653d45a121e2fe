use thiserror::Error;

/// The error returned by [`AvlTree::find`] and [`BinarySearchTree::find`] when no element is
/// stored under the requested key.
///
/// [`AvlTree::find`]: crate::AvlTree::find
/// [`BinarySearchTree::find`]: crate::BinarySearchTree::find
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("key not found")]
pub struct KeyError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_error_display() {
        extern crate std;
        use std::string::ToString;

        assert_eq!(KeyError.to_string(), "key not found");
    }
}
