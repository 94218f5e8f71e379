//! Grouping of messages into pipeline units.
//!
//! Consecutive object messages are collected into one batch. A dataset
//! message always stands alone: the pending batch is emitted first, then the
//! dataset message, so index lifecycle operations keep their position
//! relative to the writes around them.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::Stream;
use spacetime_indexer_shared::{DatasetMessage, Message, ObjectMessage};

use crate::errors::IngestError;

/// One unit of work for the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineUnit {
    /// A non-empty batch of consecutive object messages.
    Objects(Vec<ObjectMessage>),
    /// A single dataset lifecycle message.
    Dataset(DatasetMessage),
}

enum BatcherState {
    Accumulating,
    /// The pending batch was emitted; the dataset message goes next.
    Flushing(DatasetMessage),
    /// The pending batch was emitted; the input error goes next.
    Failing(IngestError),
    Done,
}

/// Groups a message stream into [`PipelineUnit`]s.
///
/// Units are produced as soon as their boundary is seen; the input is never
/// collected up front. Concatenating the emitted units gives back the input
/// sequence. An input error is passed through after the batch pending at
/// that point, and ends the output.
pub struct MessageBatcher<S> {
    messages: S,
    max_batch_size: Option<usize>,
    pending: Vec<ObjectMessage>,
    state: BatcherState,
}

impl<S> MessageBatcher<S>
where
    S: Stream<Item = Result<Message, IngestError>> + Unpin,
{
    /// Create a batcher. `max_batch_size` caps the number of objects per batch.
    pub fn new(messages: S, max_batch_size: Option<usize>) -> Self {
        Self {
            messages,
            max_batch_size: max_batch_size.filter(|max| *max > 0),
            pending: Vec::new(),
            state: BatcherState::Accumulating,
        }
    }

    fn take_pending(&mut self) -> Option<PipelineUnit> {
        if self.pending.is_empty() {
            None
        } else {
            Some(PipelineUnit::Objects(std::mem::take(&mut self.pending)))
        }
    }

    fn batch_full(&self) -> bool {
        self.max_batch_size
            .is_some_and(|max| self.pending.len() >= max)
    }
}

impl<S> Stream for MessageBatcher<S>
where
    S: Stream<Item = Result<Message, IngestError>> + Unpin,
{
    type Item = Result<PipelineUnit, IngestError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match std::mem::replace(&mut this.state, BatcherState::Accumulating) {
            BatcherState::Flushing(dataset) => {
                return Poll::Ready(Some(Ok(PipelineUnit::Dataset(dataset))))
            }
            BatcherState::Failing(e) => {
                this.state = BatcherState::Done;
                return Poll::Ready(Some(Err(e)));
            }
            BatcherState::Done => {
                this.state = BatcherState::Done;
                return Poll::Ready(None);
            }
            BatcherState::Accumulating => {}
        }

        loop {
            if this.batch_full() {
                return Poll::Ready(this.take_pending().map(Ok));
            }

            // Pending objects stay buffered while the input has nothing new.
            match ready!(Pin::new(&mut this.messages).poll_next(cx)) {
                Some(Ok(Message::Object(object))) => this.pending.push(object),
                Some(Ok(Message::Dataset(dataset))) => {
                    return Poll::Ready(match this.take_pending() {
                        Some(batch) => {
                            this.state = BatcherState::Flushing(dataset);
                            Some(Ok(batch))
                        }
                        None => Some(Ok(PipelineUnit::Dataset(dataset))),
                    });
                }
                Some(Err(e)) => {
                    return Poll::Ready(match this.take_pending() {
                        Some(batch) => {
                            this.state = BatcherState::Failing(e);
                            Some(Ok(batch))
                        }
                        None => {
                            this.state = BatcherState::Done;
                            Some(Err(e))
                        }
                    });
                }
                None => {
                    this.state = BatcherState::Done;
                    return Poll::Ready(this.take_pending().map(Ok));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};
    use spacetime_indexer_shared::{Action, DatasetPayload, ObjectPayload};
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    fn object(id: &str) -> Message {
        let payload: ObjectPayload =
            serde_json::from_value(serde_json::json!({ "id": id, "type": "t" })).unwrap();
        Message::Object(ObjectMessage::new(Action::Create, payload, "ds1"))
    }

    fn dataset(id: &str) -> Message {
        Message::Dataset(DatasetMessage::new(
            Action::Create,
            DatasetPayload {
                id: id.to_string(),
                jsonld_context: None,
            },
        ))
    }

    async fn batch(messages: Vec<Message>, max_batch_size: Option<usize>) -> Vec<PipelineUnit> {
        MessageBatcher::new(stream::iter(messages.into_iter().map(Ok)), max_batch_size)
            .map(|unit| unit.unwrap())
            .collect()
            .await
    }

    /// Render units as `[ids]` for objects and `D:id` for datasets.
    fn shape(units: &[PipelineUnit]) -> Vec<String> {
        units
            .iter()
            .map(|unit| match unit {
                PipelineUnit::Objects(objects) => format!(
                    "[{}]",
                    objects
                        .iter()
                        .map(|o| o.payload.id.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                ),
                PipelineUnit::Dataset(d) => format!("D:{}", d.payload.id),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_dataset_messages_split_object_runs() {
        let units = batch(
            vec![dataset("A"), object("1"), object("2"), dataset("B"), object("3")],
            None,
        )
        .await;
        assert_eq!(shape(&units), vec!["D:A", "[1,2]", "D:B", "[3]"]);
    }

    #[tokio::test]
    async fn test_dataset_between_object_runs_yields_three_units() {
        let units = batch(
            vec![
                object("1"),
                object("2"),
                object("3"),
                dataset("A"),
                object("4"),
                object("5"),
            ],
            None,
        )
        .await;
        assert_eq!(shape(&units), vec!["[1,2,3]", "D:A", "[4,5]"]);
    }

    #[tokio::test]
    async fn test_objects_only_form_one_batch() {
        let units = batch(vec![object("1"), object("2"), object("3")], None).await;
        assert_eq!(shape(&units), vec!["[1,2,3]"]);
    }

    #[tokio::test]
    async fn test_consecutive_datasets_and_empty_input() {
        let units = batch(vec![dataset("A"), dataset("B")], None).await;
        assert_eq!(shape(&units), vec!["D:A", "D:B"]);

        assert!(batch(Vec::new(), None).await.is_empty());
    }

    #[tokio::test]
    async fn test_max_batch_size_splits_runs() {
        let messages = vec![object("1"), object("2"), object("3"), dataset("A"), object("4")];
        let units = batch(messages, Some(2)).await;
        assert_eq!(shape(&units), vec!["[1,2]", "[3]", "D:A", "[4]"]);
    }

    #[tokio::test]
    async fn test_error_follows_pending_batch_and_ends_output() {
        let messages = vec![
            Ok(object("1")),
            Err(IngestError::consumer("disk gone")),
            Ok(object("2")),
        ];
        let mut batcher = MessageBatcher::new(stream::iter(messages), None);

        assert!(matches!(
            batcher.next().await,
            Some(Ok(PipelineUnit::Objects(ref o))) if o.len() == 1
        ));
        assert!(matches!(batcher.next().await, Some(Err(IngestError::ConsumerError(_)))));
        assert!(batcher.next().await.is_none());
    }

    #[tokio::test]
    async fn test_units_are_emitted_before_input_ends() {
        let (sender, receiver) = mpsc::channel(8);
        let mut batcher = MessageBatcher::new(ReceiverStream::new(receiver), None);

        sender.send(Ok(object("1"))).await.unwrap();
        sender.send(Ok(object("2"))).await.unwrap();
        sender.send(Ok(dataset("A"))).await.unwrap();

        // The input is still open, yet the batch and the dataset are ready.
        assert_eq!(shape(&[batcher.next().await.unwrap().unwrap()]), vec!["[1,2]"]);
        assert_eq!(shape(&[batcher.next().await.unwrap().unwrap()]), vec!["D:A"]);

        sender.send(Ok(object("3"))).await.unwrap();
        drop(sender);
        assert_eq!(shape(&[batcher.next().await.unwrap().unwrap()]), vec!["[3]"]);
        assert!(batcher.next().await.is_none());
    }
}
