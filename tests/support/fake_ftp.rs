//! Minimal single-user FTP server on 127.0.0.1 for exercising the real client.
//!
//! Understands USER, PASS, TYPE, CWD, PASV, RETR and QUIT; every command line
//! it receives is recorded before it is answered.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub struct FakeFtpServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
}

impl FakeFtpServer {
    pub fn start(files: &[(&str, &[u8])]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let files: HashMap<String, Vec<u8>> = files
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_vec()))
            .collect();

        let log = commands.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => serve_session(stream, &files, &log),
                    Err(_) => break,
                }
            }
        });

        Self { addr, commands }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `ftp://127.0.0.1:<port><path>`
    pub fn prefix(&self, path: &str) -> String {
        self.prefix_for_host("127.0.0.1", path)
    }

    pub fn prefix_for_host(&self, host: &str, path: &str) -> String {
        format!("ftp://{}:{}{}", host, self.port(), path)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

fn reply(stream: &mut TcpStream, line: &str) -> bool {
    stream.write_all(format!("{}\r\n", line).as_bytes()).is_ok()
}

fn serve_session(
    mut control: TcpStream,
    files: &HashMap<String, Vec<u8>>,
    log: &Arc<Mutex<Vec<String>>>,
) {
    let mut reader = match control.try_clone() {
        Ok(stream) => BufReader::new(stream),
        Err(_) => return,
    };
    if !reply(&mut control, "220 fake server ready") {
        return;
    }

    let mut passive: Option<TcpListener> = None;
    let mut cwd = "/".to_string();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end().to_string();
        log.lock().unwrap().push(line.clone());

        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        let ok = match verb.as_str() {
            "USER" => reply(&mut control, "331 password required"),
            "PASS" => reply(&mut control, "230 logged in"),
            "TYPE" => reply(&mut control, "200 type set"),
            "CWD" => {
                cwd = arg;
                reply(&mut control, "250 directory changed")
            }
            "PASV" => {
                let listener = match TcpListener::bind("127.0.0.1:0") {
                    Ok(listener) => listener,
                    Err(_) => return,
                };
                let port = listener.local_addr().map(|a| a.port()).unwrap_or(0);
                passive = Some(listener);
                reply(
                    &mut control,
                    &format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{})",
                        port >> 8,
                        port & 0xff
                    ),
                )
            }
            "RETR" => {
                match (files.get(&arg), passive.as_ref()) {
                    (Some(body), Some(listener)) => {
                        if !reply(&mut control, "150 opening data connection") {
                            return;
                        }
                        if let Ok((mut data, _)) = listener.accept() {
                            let _ = data.write_all(body);
                        }
                        passive = None;
                        reply(&mut control, "226 transfer complete")
                    }
                    // The listener stays open so the client's data connect
                    // still succeeds before it reads the refusal
                    _ => reply(
                        &mut control,
                        &format!("550 {}/{}: no such file", cwd.trim_end_matches('/'), arg),
                    ),
                }
            }
            "QUIT" => {
                reply(&mut control, "221 goodbye");
                return;
            }
            _ => reply(&mut control, "502 command not implemented"),
        };

        if !ok {
            return;
        }
    }
}
