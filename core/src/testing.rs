//! In-memory executors for engine tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::{StepExecutor, StepOutput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(String),
    End(String),
}

/// Records every command it is asked to run and reports a fixed exit code.
/// Tracks how many commands were in flight at once.
pub struct RecordingExecutor {
    pub exit_code: i32,
    pub delay: Duration,
    pub fail_launch: bool,
    state: Mutex<Recorded>,
}

#[derive(Default)]
struct Recorded {
    commands: Vec<String>,
    events: Vec<Event>,
    in_flight: usize,
    max_in_flight: usize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            exit_code: 0,
            delay: Duration::ZERO,
            fail_launch: false,
            state: Mutex::new(Recorded::default()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn launches(&self) -> usize {
        self.state.lock().unwrap().commands.len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

#[async_trait]
impl StepExecutor for RecordingExecutor {
    async fn run(&self, command: &str) -> anyhow::Result<StepOutput> {
        {
            let mut state = self.state.lock().unwrap();
            state.commands.push(command.to_string());
            if self.fail_launch {
                anyhow::bail!("launch refused");
            }
            state.events.push(Event::Start(command.to_string()));
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        tokio::time::sleep(self.delay).await;

        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;
        state.events.push(Event::End(command.to_string()));

        Ok(StepOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(self.exit_code),
        })
    }
}
