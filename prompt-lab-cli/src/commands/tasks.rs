//! Task listing commands

use anyhow::Result;
use prompt_lab_workflow::TaskInfo;
use serde::Serialize;

use crate::context::Context;
use crate::output::{print_field, print_list_field, print_section, TableDisplay};

/// Displayable task for output
#[derive(Debug, Serialize)]
struct TaskDisplay {
    key: String,
    name: String,
    test_data_count: usize,
    available_strategies: Vec<String>,
}

impl From<TaskInfo> for TaskDisplay {
    fn from(info: TaskInfo) -> Self {
        Self {
            key: info.key,
            name: info.name,
            test_data_count: info.test_data_count,
            available_strategies: info.available_strategies,
        }
    }
}

impl TableDisplay for TaskDisplay {
    fn headers(&self) -> Vec<&'static str> {
        vec!["Key", "Name", "Test Cases", "Strategies"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.name.clone(),
            self.test_data_count.to_string(),
            self.available_strategies.join(", "),
        ]
    }

    fn display_single(&self) {
        print_section("Task");
        print_field("Key", &self.key);
        print_field("Name", &self.name);
        print_field("Test cases", &self.test_data_count.to_string());
        print_list_field("Strategies", &self.available_strategies);
    }
}

pub fn list(ctx: &Context) -> Result<()> {
    let runner = ctx.create_runner()?;
    let items = runner
        .list_available_tasks()
        .iter()
        .map(|key| runner.task_info(key).map(TaskDisplay::from))
        .collect::<prompt_lab_core::Result<Vec<_>>>()?;

    ctx.output
        .write_list(&items, &["Key", "Name", "Test Cases", "Strategies"])
}

pub fn info(ctx: &Context, task: &str) -> Result<()> {
    let runner = ctx.create_runner()?;
    let info = runner.task_info(task)?;
    ctx.output.write(&TaskDisplay::from(info))
}
