// Integration tests for a single agent turn
use async_trait::async_trait;
use futures_util::stream;
use roundtable::client_wrapper::{ChunkStream, ClientError, ClientWrapper, ContextMessage};
use roundtable::context::WorkingContext;
use roundtable::error::StoreError;
use roundtable::room::{MessageRole, Room};
use roundtable::scheduler::RunHandle;
use roundtable::store::{InMemoryRoomStore, MessageStore};
use roundtable::turn_executor::{failure_message, AgentTurnExecutor, TurnOutcome, TurnPosition};
use roundtable::{Agent, Role};
use std::sync::{Arc, Mutex};

// Mock client streaming a fixed list of chunks, optionally failing mid-stream
struct ChunkClient {
    chunks: Vec<&'static str>,
    fail_after: Option<usize>,
    refuse_stream: bool,
    seen: Mutex<Vec<Vec<ContextMessage>>>,
}

impl ChunkClient {
    fn new(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            fail_after: None,
            refuse_stream: false,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ClientWrapper for ChunkClient {
    async fn send_message(
        &self,
        messages: &[ContextMessage],
        _agent: Option<&Agent>,
    ) -> Result<String, ClientError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        Ok(self.chunks.concat())
    }

    async fn send_message_stream(
        &self,
        messages: &[ContextMessage],
        _agent: Option<&Agent>,
    ) -> Result<ChunkStream, ClientError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if self.refuse_stream {
            return Err("503 service unavailable".into());
        }
        let mut items: Vec<Result<String, ClientError>> =
            self.chunks.iter().map(|c| Ok(c.to_string())).collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err("connection reset".into()));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

// Store wrapper recording every content write
struct RecordingStore {
    inner: InMemoryRoomStore,
    writes: Mutex<Vec<String>>,
}

#[async_trait]
impl MessageStore for RecordingStore {
    async fn room(&self, room_id: &str) -> Result<Room, StoreError> {
        self.inner.room(room_id).await
    }

    async fn create_message(
        &self,
        room_id: &str,
        role: MessageRole,
        agent_id: Option<&str>,
    ) -> Result<String, StoreError> {
        self.inner.create_message(room_id, role, agent_id).await
    }

    async fn set_content(
        &self,
        room_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(content.to_string());
        self.inner.set_content(room_id, message_id, content).await
    }
}

fn recording_store() -> (Arc<RecordingStore>, String) {
    let inner = InMemoryRoomStore::new();
    let room_id = inner.create_room("Lab").unwrap();
    let store = Arc::new(RecordingStore {
        inner,
        writes: Mutex::new(Vec::new()),
    });
    (store, room_id)
}

const POSITION: TurnPosition = TurnPosition {
    round: 1,
    order_index: 0,
};

#[tokio::test]
async fn test_streamed_chunks_accumulate_into_message() {
    roundtable::init_logger();
    let (store, room_id) = recording_store();
    let client = Arc::new(ChunkClient::new(vec!["Hel", "lo ", "world"]));
    let executor = AgentTurnExecutor::new(store.clone(), client.clone());
    let agent = Agent::new("a1", "Alpha Bot", "be brief");
    let mut context = WorkingContext::seed(&[], "Hi");
    let handle = RunHandle::new(&room_id);

    let outcome = executor
        .run(&room_id, POSITION, &mut context, &agent, true, &handle)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        *store.writes.lock().unwrap(),
        vec!["Hel", "Hello ", "Hello world"],
        "each chunk should rewrite the full accumulated text"
    );

    let room = store.room(&room_id).await.unwrap();
    let message = room.message(outcome.message_id()).unwrap();
    assert_eq!(message.content, "Hello world");
    assert_eq!(message.agent_id.as_deref(), Some("a1"));
    assert_eq!(message.role, MessageRole::Assistant);

    assert_eq!(context.len(), 2);
    let reply = &context.messages()[1];
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Hello world");
    assert_eq!(reply.name.as_deref(), Some("AlphaBot"));
    assert_eq!(handle.streaming_agent_id(), None);
}

#[tokio::test]
async fn test_mid_stream_failure_overwrites_partial_text() {
    let (store, room_id) = recording_store();
    let mut client = ChunkClient::new(vec!["Par", "tial", "never"]);
    client.fail_after = Some(2);
    let executor = AgentTurnExecutor::new(store.clone(), Arc::new(client));
    let agent = Agent::new("a1", "Alpha", "");
    let mut context = WorkingContext::seed(&[], "Hi");
    let handle = RunHandle::new(&room_id);

    let outcome = executor
        .run(&room_id, POSITION, &mut context, &agent, true, &handle)
        .await
        .unwrap();

    match &outcome {
        TurnOutcome::Failed { error, .. } => assert!(error.contains("connection reset")),
        other => panic!("expected failure, got {:?}", other),
    }
    let room = store.room(&room_id).await.unwrap();
    assert_eq!(
        room.message(outcome.message_id()).unwrap().content,
        failure_message("Alpha")
    );
    assert_eq!(context.len(), 1, "failed turns stay out of the context");
}

#[tokio::test]
async fn test_stream_refused_before_first_chunk() {
    let (store, room_id) = recording_store();
    let mut client = ChunkClient::new(vec!["unused"]);
    client.refuse_stream = true;
    let executor = AgentTurnExecutor::new(store.clone(), Arc::new(client));
    let agent = Agent::new("b1", "Beta", "");
    let mut context = WorkingContext::seed(&[], "Hi");
    let before = context.clone();
    let handle = RunHandle::new(&room_id);

    let outcome = executor
        .run(&room_id, POSITION, &mut context, &agent, true, &handle)
        .await
        .unwrap();

    match &outcome {
        TurnOutcome::Failed { error, .. } => assert!(error.contains("503")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(
        *store.writes.lock().unwrap(),
        vec!["Error: Failed to get response from Beta"]
    );
    let room = store.room(&room_id).await.unwrap();
    assert_eq!(
        room.message(outcome.message_id()).unwrap().content,
        failure_message("Beta")
    );
    assert_eq!(context, before);
    assert_eq!(handle.streaming_agent_id(), None);
}

#[tokio::test]
async fn test_non_streaming_writes_once() {
    let (store, room_id) = recording_store();
    let client = Arc::new(ChunkClient::new(vec!["all ", "at once"]));
    let executor = AgentTurnExecutor::new(store.clone(), client.clone());
    let agent = Agent::new("a1", "Alpha", "");
    let mut context = WorkingContext::seed(&[], "Hi");
    let handle = RunHandle::new(&room_id);

    executor
        .run(&room_id, POSITION, &mut context, &agent, false, &handle)
        .await
        .unwrap();

    assert_eq!(*store.writes.lock().unwrap(), vec!["all at once"]);
    assert_eq!(client.seen.lock().unwrap()[0], vec![ContextMessage::user("Hi")]);
}

#[tokio::test]
async fn test_unknown_room_is_a_store_error() {
    let (store, _room_id) = recording_store();
    let executor = AgentTurnExecutor::new(store, Arc::new(ChunkClient::new(vec!["x"])));
    let agent = Agent::new("a1", "Alpha", "");
    let mut context = WorkingContext::seed(&[], "Hi");
    let handle = RunHandle::new("missing");

    let result = executor
        .run("missing", POSITION, &mut context, &agent, true, &handle)
        .await;
    assert_eq!(result, Err(StoreError::RoomNotFound("missing".into())));
}
