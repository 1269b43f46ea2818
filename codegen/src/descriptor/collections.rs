//! The fixed table of read-only collection kinds and their mutable counterparts.

use super::{Base, TypeDescriptor};

/// Family of a read-only collection that has a mutable counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CollectionKind {
    /// `&Vec<T>`, `&VecDeque<T>`, `&LinkedList<T>`
    List,
    /// `&HashSet<T>`, `&BTreeSet<T>`
    Set,
    /// `&[T]`
    Collection,
    /// `&HashMap<K, V>`, `&BTreeMap<K, V>`
    Map,
    /// Borrowing iterators such as `slice::Iter<'a, T>` or `hash_map::Values<'a, K, V>`
    Iterator,
}

/// Owned collections that become mutable by borrowing them exclusively.
const BORROWED: [(&str, CollectionKind); 7] = [
    ("Vec", CollectionKind::List),
    ("VecDeque", CollectionKind::List),
    ("LinkedList", CollectionKind::List),
    ("HashSet", CollectionKind::Set),
    ("BTreeSet", CollectionKind::Set),
    ("HashMap", CollectionKind::Map),
    ("BTreeMap", CollectionKind::Map),
];

/// `(module, read-only iterator, mutable iterator)`
const ITERATORS: [(&str, &str, &str); 7] = [
    ("slice", "Iter", "IterMut"),
    ("vec_deque", "Iter", "IterMut"),
    ("linked_list", "Iter", "IterMut"),
    ("hash_map", "Iter", "IterMut"),
    ("btree_map", "Iter", "IterMut"),
    ("hash_map", "Values", "ValuesMut"),
    ("btree_map", "Values", "ValuesMut"),
];

/// How a descriptor matched the collection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Recognized {
    /// A reference to a collection; `mutable` when it is already exclusive.
    Reference {
        kind:    CollectionKind,
        mutable: bool,
    },
    /// A read-only iterator and the path of its mutable counterpart.
    ReadOnlyIterator { counterpart: String },
    /// An iterator that already yields mutable references.
    MutableIterator,
}

impl Recognized {
    pub(super) const fn kind(&self) -> CollectionKind {
        match self {
            Self::Reference { kind, .. } => *kind,
            Self::ReadOnlyIterator { .. } | Self::MutableIterator => CollectionKind::Iterator,
        }
    }
}

/// Match `descriptor` against the collection table, ignoring top-level nullability.
pub(super) fn recognize(descriptor: &TypeDescriptor) -> Option<Recognized> {
    match &descriptor.base {
        Base::Reference { mutable, .. } => {
            let referent = descriptor.args.first()?;
            let kind = match &referent.base {
                Base::Slice => CollectionKind::Collection,
                Base::Named(path) => borrowed_kind(last_segment(path))?,
                _ => return None,
            };
            Some(Recognized::Reference {
                kind,
                mutable: *mutable || descriptor.mutable_collection,
            })
        },
        Base::Named(path) => recognize_iterator(path),
        _ => None,
    }
}

/// Look up the kind of a borrowed collection type by its final path segment.
fn borrowed_kind(name: &str) -> Option<CollectionKind> {
    BORROWED
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, kind)| *kind)
}

fn recognize_iterator(path: &str) -> Option<Recognized> {
    let mut segments = path.rsplit("::");
    let name = segments.next()?;
    let module = segments.next()?;
    ITERATORS
        .iter()
        .filter(|(candidate, ..)| *candidate == module)
        .find_map(|(_, read_only, mutable)| {
            if name == *read_only {
                let prefix = &path[..path.len() - name.len()];
                Some(Recognized::ReadOnlyIterator {
                    counterpart: format!("{prefix}{mutable}"),
                })
            } else if name == *mutable {
                Some(Recognized::MutableIterator)
            } else {
                None
            }
        })
}

fn last_segment(path: &str) -> &str { path.rsplit("::").next().unwrap_or(path) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_borrowed_collections_by_last_segment() {
        let vec = TypeDescriptor::reference(
            Some("'a"),
            false,
            TypeDescriptor::named("std::vec::Vec", vec![TypeDescriptor::primitive("u8")]),
        );
        assert_eq!(
            recognize(&vec),
            Some(Recognized::Reference {
                kind:    CollectionKind::List,
                mutable: false,
            })
        );

        let slice = TypeDescriptor::reference(None, true, TypeDescriptor::slice(TypeDescriptor::primitive("u8")));
        assert_eq!(
            recognize(&slice),
            Some(Recognized::Reference {
                kind:    CollectionKind::Collection,
                mutable: true,
            })
        );
    }

    #[test]
    fn owned_collections_are_not_recognized() {
        let owned = TypeDescriptor::named("Vec", vec![TypeDescriptor::primitive("u8")]);
        assert_eq!(recognize(&owned), None);
    }

    #[test]
    fn iterators_need_their_module_segment() {
        let qualified = TypeDescriptor::named(
            "std::collections::hash_map::Values",
            vec![
                TypeDescriptor::lifetime("'a"),
                TypeDescriptor::named("String", Vec::new()),
                TypeDescriptor::primitive("u32"),
            ],
        );
        assert_eq!(
            recognize(&qualified),
            Some(Recognized::ReadOnlyIterator {
                counterpart: "std::collections::hash_map::ValuesMut".to_string(),
            })
        );

        let bare = TypeDescriptor::named("Iter", vec![TypeDescriptor::primitive("u8")]);
        assert_eq!(recognize(&bare), None);

        let unrelated = TypeDescriptor::named("string::Iter", Vec::new());
        assert_eq!(recognize(&unrelated), None);
    }

    #[test]
    fn mutable_iterators_are_recognized_as_such() {
        let iter_mut = TypeDescriptor::named("slice::IterMut", vec![TypeDescriptor::primitive("u8")]);
        assert_eq!(recognize(&iter_mut), Some(Recognized::MutableIterator));
    }
}
