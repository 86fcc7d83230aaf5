//! `host[:port]` parsing for the target box and the command line.

/// Split `input` into host and port. A trailing `:<port>` is only taken as a
/// port when it parses; anything else is left in the host so the fetch can
/// report it. An empty host is returned as-is and rejected downstream.
pub fn parse_target(input: &str, default_port: u16) -> (String, u16) {
    let input = input.trim();
    if let Some((host, port)) = input.rsplit_once(':') {
        if let Ok(port) = port.trim().parse::<u16>() {
            return (host.trim().to_string(), port);
        }
    }
    (input.to_string(), default_port)
}
