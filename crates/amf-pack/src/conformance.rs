//! Fixture support: build expected messages by hand and compare decoded
//! messages against them.

use std::mem;

use crate::envelope::ActionMessage;
use crate::error::{IndexOutOfRange, MalformedInput};
use crate::value::{first_difference, Heap, Mismatch, OrderedCollection, Value};

/// Allocates a collection of `len` nulls.
pub fn create_list(heap: &mut Heap, len: usize) -> Value {
    heap.alloc_collection(OrderedCollection::with_len(len))
}

/// Sets element `index` of `list`. A value that is not a collection handle
/// counts as an empty list.
pub fn add_to_list(
    heap: &mut Heap,
    list: &Value,
    index: usize,
    value: impl Into<Value>,
) -> Result<(), IndexOutOfRange> {
    let collection = match list {
        Value::Collection(id) => heap.collection_mut(*id),
        _ => None,
    };
    match collection {
        Some(collection) => collection.set(index, value).map(|_| ()),
        None => Err(IndexOutOfRange { index, len: 0 }),
    }
}

/// A fixture: the outcome a known input must decode to, either a message or
/// a failure.
pub trait Confirmation {
    /// The message a successful decode must produce. Not consulted when
    /// [`expected_error`](Self::expected_error) returns `Some`.
    fn expected_message(&self) -> ActionMessage;

    /// The failure decoding must report instead of a message. Only the
    /// variant is compared; offsets and other fields may differ.
    fn expected_error(&self) -> Option<MalformedInput> {
        None
    }

    /// Checks a decode outcome against the fixture.
    fn confirm(&self, outcome: &Result<ActionMessage, MalformedInput>) -> Result<(), Mismatch> {
        match (self.expected_error(), outcome) {
            (None, Ok(actual)) => confirm(&self.expected_message(), actual),
            (None, Err(err)) => Err(Mismatch {
                path: "outcome".to_owned(),
                reason: format!("expected a message, decoding failed: {err}"),
            }),
            (Some(expected), Ok(_)) => Err(Mismatch {
                path: "outcome".to_owned(),
                reason: format!("expected failure like \"{expected}\", decoded a message"),
            }),
            (Some(expected), Err(err)) if mem::discriminant(&expected) != mem::discriminant(err) => {
                Err(Mismatch {
                    path: "outcome".to_owned(),
                    reason: format!("expected failure like \"{expected}\", found \"{err}\""),
                })
            }
            (Some(_), Err(_)) => Ok(()),
        }
    }
}

fn count_mismatch(what: &str, expected: usize, actual: usize) -> Result<(), Mismatch> {
    if expected == actual {
        return Ok(());
    }
    Err(Mismatch {
        path: what.to_owned(),
        reason: format!("expected {expected} {what}, found {actual}"),
    })
}

/// Compares the values of two messages, re-rooting the reported path at
/// `prefix`.
fn compare_values(
    prefix: String,
    expected: (&Heap, &Value),
    actual: (&Heap, &Value),
) -> Result<(), Mismatch> {
    match first_difference(expected.0, expected.1, actual.0, actual.1) {
        None => Ok(()),
        Some(mismatch) => Err(Mismatch {
            path: format!("{prefix}{}", mismatch.path.trim_start_matches('$')),
            reason: mismatch.reason,
        }),
    }
}

fn compare_field(path: String, expected: &str, actual: &str) -> Result<(), Mismatch> {
    if expected == actual {
        return Ok(());
    }
    Err(Mismatch {
        path,
        reason: format!("expected {expected:?}, found {actual:?}"),
    })
}

/// Compares headers and bodies of two messages in order. The envelope
/// version is not compared.
pub fn confirm(expected: &ActionMessage, actual: &ActionMessage) -> Result<(), Mismatch> {
    let (heap_e, heap_a) = (expected.heap(), actual.heap());

    count_mismatch("headers", expected.header_count(), actual.header_count())?;
    for (i, (e, a)) in expected.headers().iter().zip(actual.headers()).enumerate() {
        compare_field(format!("headers[{i}].name"), &e.name, &a.name)?;
        if e.must_understand != a.must_understand {
            return Err(Mismatch {
                path: format!("headers[{i}].mustUnderstand"),
                reason: format!("expected {}, found {}", e.must_understand, a.must_understand),
            });
        }
        compare_values(format!("headers[{i}]"), (heap_e, &e.value), (heap_a, &a.value))?;
    }

    count_mismatch("bodies", expected.body_count(), actual.body_count())?;
    for (i, (e, a)) in expected.bodies().iter().zip(actual.bodies()).enumerate() {
        compare_field(format!("bodies[{i}].targetURI"), &e.target_uri, &a.target_uri)?;
        compare_field(
            format!("bodies[{i}].responseURI"),
            &e.response_uri,
            &a.response_uri,
        )?;
        compare_values(format!("bodies[{i}]"), (heap_e, &e.data), (heap_a, &a.data))?;
    }
    Ok(())
}

/// Panics with the first difference unless the messages are equal under
/// [`confirm`].
#[track_caller]
pub fn assert_messages_equal(expected: &ActionMessage, actual: &ActionMessage) {
    if let Err(mismatch) = confirm(expected, actual) {
        panic!("messages differ at {mismatch}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageBody;
    use crate::value::DynamicRecord;

    fn list_message(values: &[bool]) -> ActionMessage {
        let mut message = ActionMessage::new();
        let heap = message.heap_mut();
        let list = create_list(heap, values.len());
        for (i, v) in values.iter().enumerate() {
            add_to_list(heap, &list, i, *v).unwrap();
        }
        message.add_body(MessageBody::new(list));
        message
    }

    #[test]
    fn list_helpers() {
        let mut heap = Heap::new();
        let list = create_list(&mut heap, 2);
        assert_eq!(
            add_to_list(&mut heap, &list, 2, true),
            Err(IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            add_to_list(&mut heap, &Value::Null, 0, true),
            Err(IndexOutOfRange { index: 0, len: 0 })
        );
        add_to_list(&mut heap, &list, 1, true).unwrap();
        let collection = heap.collection(list.node_id().unwrap()).unwrap();
        assert_eq!(collection.as_slice(), [Value::Null, Value::Boolean(true)]);
    }

    #[test]
    fn reports_path_of_difference() {
        let expected = list_message(&[false, true]);
        let actual = list_message(&[false, false]);
        let mismatch = confirm(&expected, &actual).unwrap_err();
        assert_eq!(mismatch.path, "bodies[0][1]");
        assert!(confirm(&expected, &list_message(&[false, true])).is_ok());
    }

    #[test]
    fn version_is_ignored_but_uris_are_not() {
        let mut expected = ActionMessage::new();
        expected.add_body(MessageBody::new(1));
        let mut actual = ActionMessage::new();
        actual.version = 0;
        actual.add_body(MessageBody::new(1));
        assert!(confirm(&expected, &actual).is_ok());

        actual.body_mut(0).unwrap().target_uri = "x".to_owned();
        let mismatch = confirm(&expected, &actual).unwrap_err();
        assert_eq!(mismatch.path, "bodies[0].targetURI");
    }

    #[test]
    fn body_count_differs() {
        let expected = list_message(&[]);
        let mismatch = confirm(&expected, &ActionMessage::new()).unwrap_err();
        assert_eq!(mismatch.path, "bodies");
    }

    struct Fixture;

    impl Confirmation for Fixture {
        fn expected_message(&self) -> ActionMessage {
            let mut message = ActionMessage::new();
            let rec = message
                .heap_mut()
                .alloc_record([("prop0", -2000)].into_iter().collect::<DynamicRecord>());
            message.add_body(MessageBody::new(rec));
            message
        }
    }

    struct Rejects;

    impl Confirmation for Rejects {
        fn expected_message(&self) -> ActionMessage {
            ActionMessage::new()
        }

        fn expected_error(&self) -> Option<MalformedInput> {
            Some(MalformedInput::TrailingBytes {
                offset: 0,
                count: 0,
            })
        }
    }

    #[test]
    fn trait_default_confirm() {
        let fixture = Fixture;
        assert!(fixture.confirm(&Ok(fixture.expected_message())).is_ok());
        assert!(fixture.confirm(&Ok(ActionMessage::new())).is_err());
        let failed = Err(MalformedInput::InvalidUtf8 { offset: 3 });
        assert_eq!(fixture.confirm(&failed).unwrap_err().path, "outcome");
    }

    #[test]
    fn expected_error_matches_by_variant() {
        let trailing = Err(MalformedInput::TrailingBytes {
            offset: 12,
            count: 4,
        });
        assert!(Rejects.confirm(&trailing).is_ok());
        assert!(Rejects
            .confirm(&Err(MalformedInput::InvalidUtf8 { offset: 12 }))
            .is_err());
        assert!(Rejects.confirm(&Ok(ActionMessage::new())).is_err());
    }

    #[test]
    #[should_panic(expected = "messages differ at bodies")]
    fn assert_panics_on_difference() {
        assert_messages_equal(&list_message(&[true]), &ActionMessage::new());
    }
}
