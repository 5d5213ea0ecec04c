//! Headless stub renderer speaking the binary protocol over stdio.
//!
//! A renderer double for CI and tests: it manages window records and
//! per-slot content digests but draws nothing. Reply formats match the real
//! renderer: the window ID as decimal ASCII for OPEN, `true` for
//! acknowledgements, the 5-field geometry string for WINDOW_INFO, and
//! `|`-joined MD5 hex digests for CHECKSUM.

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Stdin, Write};

use anyhow::{bail, Context, Result};

use easel_protocol::tag;

struct StubWindow {
    title: String,
    width: i32,
    height: i32,
    pos_x: i32,
    pos_y: i32,
    testing: bool,
    /// One digest per image slot. Slots start as the digest of no content so
    /// a checksum reply is never empty.
    checksums: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("easel-stub renderer started");

    let mut stdin = std::io::stdin();
    let mut windows: HashMap<i32, StubWindow> = HashMap::new();
    let mut next_id = 1;

    loop {
        let command = match read_i32(&mut stdin) {
            Ok(command) => command,
            // Controller closed the pipe; normal shutdown.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                log::info!("stdin closed, exiting");
                return Ok(());
            }
            Err(e) => return Err(e).context("reading command tag"),
        };

        match command {
            tag::OPEN => {
                let width = read_i32(&mut stdin)?;
                let height = read_i32(&mut stdin)?;
                let image_count = read_i32(&mut stdin)?;
                let pos_x = read_i32(&mut stdin)?;
                let pos_y = read_i32(&mut stdin)?;
                let testing = read_i32(&mut stdin)? == 1;
                let title_len = read_i32(&mut stdin)?;
                let title = String::from_utf8_lossy(&read_exact_vec(
                    &mut stdin,
                    title_len.max(0) as usize,
                )?)
                .into_owned();

                let id = next_id;
                next_id += 1;
                windows.insert(
                    id,
                    StubWindow {
                        title,
                        width,
                        height,
                        // Negative coordinates mean "renderer chooses".
                        pos_x: pos_x.max(0),
                        pos_y: pos_y.max(0),
                        testing,
                        checksums: vec![
                            format!("{:x}", md5::compute(b""));
                            image_count.max(1) as usize
                        ],
                    },
                );
                log::debug!("opened window {id}");
                reply(&id.to_string())?;
            }

            tag::CLOSE => {
                let id = read_i32(&mut stdin)?;
                let known = windows.remove(&id).is_some();
                log::debug!("closed window {id} (known: {known})");
                reply(if known { "true" } else { "false" })?;
            }

            tag::UPDATE_IMG => {
                let id = read_i32(&mut stdin)?;
                let Some(window) = windows.get_mut(&id) else {
                    // The payload length is unknowable without the window's
                    // slot count; the stream is desynced beyond recovery.
                    bail!("update for unknown window {id}");
                };
                for slot in 0..window.checksums.len() {
                    let len = read_i32(&mut stdin)?;
                    let image = read_exact_vec(&mut stdin, len.max(0) as usize)?;
                    if window.testing {
                        window.checksums[slot] = format!("{:x}", md5::compute(&image));
                    }
                }
                reply("true")?;
            }

            tag::WINDOW_INFO => {
                let id = read_i32(&mut stdin)?;
                let Some(window) = windows.get(&id) else {
                    bail!("info for unknown window {id}");
                };
                reply(&format!(
                    "{}|{}|{}|{}|{}",
                    window.width,
                    window.height,
                    window.pos_x,
                    window.pos_y,
                    window.checksums.len(),
                ))?;
            }

            tag::CHECKSUM => {
                let id = read_i32(&mut stdin)?;
                let Some(window) = windows.get(&id) else {
                    bail!("checksums for unknown window {id}");
                };
                log::debug!("checksums for window {id} ({})", window.title);
                reply(&window.checksums.join("|"))?;
            }

            other => bail!("unknown command tag: {other}"),
        }
    }
}

fn read_i32(stdin: &mut Stdin) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    stdin.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_exact_vec(stdin: &mut Stdin, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    stdin.read_exact(&mut buf)?;
    Ok(buf)
}

fn reply(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}
