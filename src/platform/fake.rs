//! Scripted platform for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    AgentRecord, ChatMessage, ListAgentsQuery, Platform, PlatformError, PlatformResult, RunAgent,
    ThreadId, ThreadMessage,
};

/// Every call the fake has seen, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListAgents(ListAgentsQuery),
    Completion { prompt: String, max_tokens: u32 },
    RunAgent(RunAgent),
    ListMessages(ThreadId),
    RequestUserInput(ThreadId),
    AddReply(ThreadId, String),
}

/// A platform whose answers are queued up front
#[derive(Default)]
pub struct FakePlatform {
    pub agents: Mutex<Option<PlatformResult<Vec<AgentRecord>>>>,
    pub completions: Mutex<VecDeque<PlatformResult<String>>>,
    pub runs: Mutex<VecDeque<PlatformResult<ThreadId>>>,
    /// Successive snapshots of the thread; the last one repeats forever
    pub snapshots: Mutex<VecDeque<PlatformResult<Vec<ThreadMessage>>>>,
    pub fail_input_requests: Mutex<bool>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakePlatform {
    pub fn with_agents(agents: Vec<AgentRecord>) -> Self {
        let fake = Self::default();
        *fake.agents.lock().unwrap() = Some(Ok(agents));
        fake
    }

    pub fn push_completion(&self, result: PlatformResult<String>) {
        self.completions.lock().unwrap().push_back(result);
    }

    pub fn push_run(&self, result: PlatformResult<ThreadId>) {
        self.runs.lock().unwrap().push_back(result);
    }

    pub fn push_snapshot(&self, messages: Vec<ThreadMessage>) {
        self.snapshots.lock().unwrap().push_back(Ok(messages));
    }

    pub fn push_snapshot_error(&self) {
        self.snapshots
            .lock()
            .unwrap()
            .push_back(Err(PlatformError::Unavailable("connection reset".into())));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn clone_result<T: Clone>(result: &PlatformResult<T>) -> PlatformResult<T> {
    match result {
        Ok(value) => Ok(value.clone()),
        Err(e) => Err(PlatformError::Unavailable(e.to_string())),
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn list_agents(&self, query: &ListAgentsQuery) -> PlatformResult<Vec<AgentRecord>> {
        self.record(Call::ListAgents(query.clone()));
        match self.agents.lock().unwrap().as_ref() {
            Some(result) => clone_result(result),
            None => Ok(Vec::new()),
        }
    }

    async fn completion(&self, messages: &[ChatMessage], max_tokens: u32) -> PlatformResult<String> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.record(Call::Completion { prompt, max_tokens });
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PlatformError::Unavailable("no completion queued".into())))
    }

    async fn run_agent(&self, request: &RunAgent) -> PlatformResult<ThreadId> {
        self.record(Call::RunAgent(request.clone()));
        self.runs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ThreadId::new("thread_1")))
    }

    async fn list_messages(&self, thread: &ThreadId) -> PlatformResult<Vec<ThreadMessage>> {
        self.record(Call::ListMessages(thread.clone()));
        let mut snapshots = self.snapshots.lock().unwrap();
        if snapshots.len() > 1 {
            return snapshots.pop_front().unwrap_or_else(|| Ok(Vec::new()));
        }
        snapshots.front().map(clone_result).unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn request_user_input(&self, thread: &ThreadId) -> PlatformResult<()> {
        self.record(Call::RequestUserInput(thread.clone()));
        if *self.fail_input_requests.lock().unwrap() {
            return Err(PlatformError::Api {
                status: 500,
                message: "input requests unavailable".into(),
            });
        }
        Ok(())
    }

    async fn add_reply(&self, thread: &ThreadId, text: &str) -> PlatformResult<()> {
        self.record(Call::AddReply(thread.clone(), text.to_string()));
        Ok(())
    }
}
