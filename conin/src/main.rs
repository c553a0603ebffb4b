// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]

#[macro_use]
extern crate tracing;

use std::{process, sync::Arc, thread};

use anyhow::{anyhow, Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conin_common::{args::Args, config::Config};
use conin_input::{
    encoding, error::InputBufferError, host::WaitTerminationReason, session::ConsoleSession,
};

pub mod replay;

use replay::Printer;

fn init_tracing(level: Level) {
    // use env for filtering
    // example
    // RUST_LOG=none,conin_input=trace cargo run

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::ACTIVE)
        .compact();
    subscriber.with(fmt_layer).init();
}

fn main() {
    let args = Args::parse(std::env::args()).unwrap_or_else(|e| {
        eprintln!("{e}");
        eprintln!("{}", Args::usage("conin"));
        process::exit(1);
    });

    if args.help {
        println!("{}", Args::usage("conin"));
        return;
    }

    let config = Config::load(args.config.as_deref());
    let level = config.as_ref().map_or(Level::INFO, |config| {
        config.logging.level.parse().unwrap_or(Level::INFO)
    });
    init_tracing(level);

    trace!("Starting conin");

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e));
            process::exit(1);
        }
    };

    if let Some(code_page) = args.code_page {
        config.input.code_page = code_page;
    }

    if let Err(e) = run(&args, &config) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let code_page = config.input.code_page;
    encoding::encoding_for_code_page(code_page)
        .with_context(|| format!("code page {code_page} cannot be used"))?;

    let mode = replay::reading_mode(args);
    info!(
        "Replaying stdin, code page {code_page}, {mode:?} reads of {}",
        args.capacity
    );

    let session = Arc::new(ConsoleSession::from_config(&config.input));
    let mut reader = session.reader();

    let writer = {
        let session = Arc::clone(&session);
        let as_keys = args.as_keys;
        thread::spawn(move || {
            let result = replay::feed(&session, std::io::stdin().lock(), as_keys);
            session.terminate_read(WaitTerminationReason::HandleClosing);
            result
        })
    };

    let mut printer = Printer::new(std::io::stdout().lock());

    loop {
        match replay::read_batch(&mut reader, mode, args.capacity) {
            Ok(batch) => printer.print(&batch)?,
            Err(InputBufferError::ReadTerminated(reason)) => {
                debug!("Reads terminated ({reason}), draining what is left");
                break;
            }
            Err(e) => return Err(e).context("read failed"),
        }
    }

    loop {
        let batch = session
            .with_buffer(|buffer| replay::read_batch(buffer, mode, args.capacity))
            .context("read failed")?;
        if batch.is_empty() {
            break;
        }
        printer.print(&batch)?;
    }

    printer.finish()?;

    let lines = writer
        .join()
        .map_err(|_| anyhow!("stdin thread panicked"))??;
    info!("Replayed {lines} lines");

    Ok(())
}
