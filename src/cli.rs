//! Interactive REPL driving the engine with simulated hardware events
//!
//! Stands in for the polling loop on a real controller: each command is
//! one debounced edge / delta / sample, and the resolved outputs go to
//! the console sinks. Config file edits hot-swap the engine between
//! commands.

use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing::info;

use crate::config::watcher::ConfigWatcher;
use crate::drivers::{ConsoleSink, FeedbackSink, MidiSink};
use crate::engine::{Engine, EngineOutput};
use crate::midi::OutboundMessage;

pub struct Repl {
    engine: Engine,
    sink: Arc<ConsoleSink>,
    watcher: Option<ConfigWatcher>,
}

impl Repl {
    pub fn new(engine: Engine, watcher: Option<ConfigWatcher>) -> Self {
        Self {
            engine,
            sink: Arc::new(ConsoleSink::new("console")),
            watcher,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{}", "footctl simulator - type 'help' for commands".bold());
        self.deliver(
            self.engine
                .initial_visuals()
                .into_iter()
                .map(EngineOutput::Visual)
                .collect(),
        )
        .await?;

        let mut rl = DefaultEditor::new()?;
        loop {
            // Pick up config edits between commands
            if let Some(new_config) = self.watcher.as_mut().and_then(|w| w.poll()) {
                info!("Config changed, resetting engine state");
                self.engine = Engine::new(new_config);
                let visuals = self
                    .engine
                    .initial_visuals()
                    .into_iter()
                    .map(EngineOutput::Visual)
                    .collect();
                self.deliver(visuals).await?;
            }

            let readline = rl.readline("footctl> ");
            let line = match readline {
                Ok(line) => line,
                Err(_) => break,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "exit" || line == "quit" {
                break;
            }
            let _ = rl.add_history_entry(line);

            match self.dispatch(line).await {
                Ok(true) => {}
                Ok(false) => println!("{}", "Unknown command - try 'help'".red()),
                Err(e) => println!("{} {}", "Error:".red(), e),
            }
        }

        info!("REPL closed after {} sends", self.sink.send_count().await);
        Ok(())
    }

    /// Returns Ok(false) for unrecognized commands
    async fn dispatch(&mut self, line: &str) -> Result<bool> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let outputs = match parts.as_slice() {
            ["help"] => {
                print_help();
                return Ok(true);
            }
            ["show"] => {
                self.print_status();
                return Ok(true);
            }
            ["reset"] => {
                self.engine.reset();
                self.engine
                    .initial_visuals()
                    .into_iter()
                    .map(EngineOutput::Visual)
                    .collect()
            }
            ["press", n] => self.engine.on_switch_edge(parse_button(n)?, true),
            ["release", n] => self.engine.on_switch_edge(parse_button(n)?, false),
            ["tap", n] => self.engine.tap(parse_button(n)?),
            ["enc", delta] => {
                let delta: i32 = delta.parse()?;
                self.engine.on_encoder_delta(delta).into_iter().map(EngineOutput::Midi).collect()
            }
            ["push"] => {
                let mut outputs: Vec<EngineOutput> = self
                    .engine
                    .on_encoder_push_edge(true)
                    .into_iter()
                    .map(EngineOutput::Midi)
                    .collect();
                outputs.extend(self.engine.on_encoder_push_edge(false).map(EngineOutput::Midi));
                outputs
            }
            ["exp1", raw] => self.expression(0, raw)?,
            ["exp2", raw] => self.expression(1, raw)?,
            ["cc", cc, value] => {
                let cc: u8 = cc.parse()?;
                let value: u8 = value.parse()?;
                self.engine.on_host_cc(cc, value)
            }
            ["rx", bytes @ ..] if !bytes.is_empty() => {
                let bytes = bytes
                    .iter()
                    .map(|b| u8::from_str_radix(b.trim_start_matches("0x"), 16))
                    .collect::<Result<Vec<u8>, _>>()?;
                match OutboundMessage::parse(&bytes) {
                    Some(OutboundMessage::ControlChange { cc, value, .. }) => {
                        self.engine.on_host_cc(cc, value)
                    }
                    Some(other) => {
                        println!("{} {}", "(no override for)".dimmed(), other);
                        Vec::new()
                    }
                    None => {
                        println!("{}", "(not a channel-voice message)".dimmed());
                        Vec::new()
                    }
                }
            }
            _ => return Ok(false),
        };

        if outputs.is_empty() {
            println!("{}", "(no output)".dimmed());
        }
        self.deliver(outputs).await?;
        Ok(true)
    }

    fn expression(&mut self, pedal: usize, raw: &str) -> Result<Vec<EngineOutput>> {
        let raw: u16 = raw.parse()?;
        Ok(self
            .engine
            .on_expression_sample(pedal, raw)
            .into_iter()
            .map(EngineOutput::Midi)
            .collect())
    }

    async fn deliver(&self, outputs: Vec<EngineOutput>) -> Result<()> {
        for output in outputs {
            match output {
                EngineOutput::Midi(message) => self.sink.send(message).await?,
                EngineOutput::Visual(visual) => self.sink.update(visual).await?,
            }
        }
        Ok(())
    }

    fn print_status(&self) {
        let config = self.engine.config();
        println!("{}", "buttons:".bold());
        for (index, button) in config.buttons.iter().enumerate() {
            let (on, keytime) = self.engine.button_status(index).unwrap_or((false, 1));
            let state = if on { "ON ".green() } else { "off".dimmed() };
            println!(
                "  {:>2} {:8} {:7} {:9} keytime {}/{} {}",
                index + 1,
                button.label_or(index),
                button.message_type.to_string(),
                format!("{:?}", button.mode).to_lowercase(),
                keytime,
                button.keytimes(),
                state,
            );
        }
        if let Some(value) = self.engine.encoder_value() {
            println!("{} {}", "encoder:".bold(), value);
        }
    }
}

fn parse_button(arg: &str) -> Result<usize> {
    let number: usize = arg.parse()?;
    anyhow::ensure!(number >= 1, "buttons are numbered from 1");
    Ok(number - 1)
}

fn print_help() {
    println!(
        "\
commands:
  press <n> | release <n> | tap <n>   footswitch edges (1-indexed)
  enc <delta>                         rotary encoder rotation
  push                                encoder push (press + release)
  exp1 <raw> | exp2 <raw>             expression pedal ADC sample (0-65535)
  cc <num> <val>                      incoming host CC (override)
  rx <hex bytes>                      incoming wire bytes, e.g. rx b0 14 7f
  show                                current button/encoder state
  reset                               back to keytime 1, all off
  exit"
    );
}
