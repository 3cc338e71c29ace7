// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Watches a small scaffolded app directory and re-runs its entry module
//! on every edit. Try editing `app/greeting.ts` while it runs.
//!
//! ```sh
//! cargo run --example hotreload
//! ```

use clap::Parser;
use owo_colors::OwoColorize;
use rekindle::{Coordinator, ModuleRegistry};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(about = "Hot-reloading module runtime demo")]
struct Args {
    /// Directory to watch and execute.
    #[arg(default_value = "app")]
    dir: PathBuf,

    /// Debounce window for change notifications, in milliseconds.
    #[arg(long, default_value_t = 100)]
    debounce_ms: u64,
}

fn scaffold(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    fs::write(dir.join("main.ts"), "// entry: requires ./greeting and prints it\n")?;
    fs::write(dir.join("greeting.ts"), "hello from the sandbox\n")?;
    Ok(())
}

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register("/main.ts", |scope| {
        let greeting = scope.require("./greeting")?.into_exports().unwrap();
        let text = greeting.get("text").and_then(|v| v.as_str().map(String::from));
        let text = text.unwrap_or_else(|| "(no greeting exported)".to_string());

        let persisted = scope.persisted();
        let builds = persisted.get("builds").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
        persisted.set("builds", json!(builds));

        println!("{} {} {}", "build".green().bold(), builds.cyan(), text);
        scope.set_interval(Duration::from_secs(2), move || {
            println!("{} generation {} is still alive", "tick".dimmed(), builds);
        });
        Ok(())
    });
    registry.register("/greeting.ts", |scope| {
        // the greeting is whatever the file on disk says right now
        scope.exports().set("text", json!(scope.file().text().trim()));
        Ok(())
    });
    registry
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rekindle=info".into()),
        )
        .init();

    let args = Args::parse();
    scaffold(&args.dir)?;

    let coordinator = Coordinator::builder(args.dir.clone())
        .debounce(Duration::from_millis(args.debounce_ms))
        .executor(registry())
        .build()?;

    println!(
        "watching {} (edit {} to see a reload)",
        args.dir.display().yellow(),
        args.dir.join("greeting.ts").display().yellow(),
    );

    let local = tokio::task::LocalSet::new();
    local.run_until(coordinator.run()).await?;
    Ok(())
}
