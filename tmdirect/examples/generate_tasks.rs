//! Generate a task list against the TM direct endpoint.
//!
//! Requires `TM_API_KEY` and `TM_MODEL`; `TM_BASE_URL` is optional.
//!
//! ```sh
//! TM_API_KEY=... TM_MODEL=glm-4.7 RUST_LOG=debug \
//!     cargo run --example generate_tasks --features full
//! ```

use serde::Deserialize;
use std::result::Result;
use tmdirect::prelude::*;
use tmdirect::schemars::{schema_for, JsonSchema};

#[derive(Debug, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct Task {
    /// Sequential task id starting at 1
    id: u32,
    title: String,
    description: String,
    /// One of `high`, `medium`, `low`
    priority: String,
    /// Ids of tasks that must be finished first
    dependencies: Vec<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct TaskList {
    tasks: Vec<Task>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let executor = tm_direct()
        .layer(RetryLayer::new().with_max_retries(2))
        .layer(LoggingLayer::new())
        .finish();

    let schema = serde_json::to_value(schema_for!(TaskList))?;

    let request = GenerationRequest::new(vec![
        Message::system("You are a project planner. Break requirements into tasks."),
        Message::user(
            "Build a CLI that syncs a local folder to object storage, \
             with resumable uploads and a dry-run mode.",
        ),
    ])
    .with_schema(schema)
    .with_object_name("tasks")
    .with_command("parse-prd")
    .with_output_type("cli")
    .with_temperature(0.2);

    match executor.generate_object(request).await {
        Ok(result) => {
            println!(
                "model={} input={} output={} total={}",
                result.model,
                result.usage.input_tokens,
                result.usage.output_tokens,
                result.usage.total_tokens
            );

            let tasks: TaskList = serde_json::from_value(result.object.into())?;
            for task in &tasks.tasks {
                println!("#{} [{}] {}", task.id, task.priority, task.title);
            }
        }
        Err(e) if e.is_validation() => eprintln!("Invalid request: {}", e.root_cause()),
        Err(e) => eprintln!("Generation failed: {}", e),
    }

    Ok(())
}
