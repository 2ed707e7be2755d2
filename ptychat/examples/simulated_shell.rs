//! Drive a simulated shell over an in-memory duplex stream.
//!
//! The "child" here behaves like busybox `sh` on a serial console: it asks
//! for the cursor position before its first prompt and echoes every command
//! back with `\r\n`.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example simulated_shell
//! ```

use ptychat::{Chat, TalkFlags};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// A tiny shell that knows `echo`, `pwd` and `exit`.
async fn fake_shell(stream: DuplexStream) -> std::io::Result<()> {
    let (rd, mut wr) = tokio::io::split(stream);
    let mut rd = BufReader::new(rd);

    wr.write_all(b"BusyBox v1.36 built-in shell (ash)\r\n\x1b[6n").await?;

    let mut line = String::new();
    loop {
        wr.write_all(b"/ # ").await?;

        line.clear();
        if rd.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        // Strip a leading cursor report (ESC [ row ; col R), if one arrived.
        let command = strip_cursor_report(&line).trim_end().to_string();

        wr.write_all(format!("{}\r\n", command).as_bytes()).await?;

        match command.as_str() {
            "exit" => return Ok(()),
            "pwd" => wr.write_all(b"/\r\n").await?,
            cmd if cmd.starts_with("echo ") => {
                wr.write_all(format!("{}\r\n", &cmd[5..]).as_bytes()).await?
            }
            cmd => {
                wr.write_all(format!("sh: {}: not found\r\n", cmd).as_bytes())
                    .await?
            }
        }
    }
}

/// Drop an `ESC [ <digits;digits> R` prefix, leaving the rest of the line.
fn strip_cursor_report(line: &str) -> &str {
    let Some(params) = line.strip_prefix("\x1b[") else {
        return line;
    };
    let end = params
        .find(|c: char| !c.is_ascii_digit() && c != ';')
        .unwrap_or(params.len());
    match params[end..].strip_prefix('R') {
        Some(rest) => rest,
        None => line,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (engine_side, child_side) = tokio::io::duplex(4096);
    let child = tokio::spawn(fake_shell(child_side));

    let mut chat = Chat::from_stream(engine_side);

    for command in ["pwd", "echo hello from ptychat", "echo READY"] {
        chat.talk(command, TalkFlags::SWALLOW_PROMPT).await?;
        let output = chat.read_line().await?;
        println!("{} => {}", command, output);
    }

    if let Err(e) = chat.talk("exit", TalkFlags::SWALLOW_PROMPT).await {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }

    drop(chat);
    child.await??;
    Ok(())
}
