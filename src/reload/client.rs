// src/reload/client.rs

/// Text frame sent to every client on reload.
pub const RELOAD_MESSAGE: &str = "reload";

/// Inline script that connects back to the reload socket.
pub fn reload_script(ws_port: u16) -> String {
    format!(
        r#"<script>(function(){{var ws=new WebSocket("ws://"+location.hostname+":{ws_port}");ws.onmessage=function(e){{if(e.data==="{RELOAD_MESSAGE}")location.reload();}};}})();</script>"#
    )
}

/// Insert the reload script before the last `</body>`, or append it.
pub fn inject_reload_script(body: &[u8], ws_port: u16) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let script = reload_script(ws_port);
    let mut out = Vec::with_capacity(body.len() + script.len());

    match body
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            out.extend_from_slice(&body[..pos]);
            out.extend_from_slice(script.as_bytes());
            out.extend_from_slice(&body[pos..]);
        }
        None => {
            out.extend_from_slice(body);
            out.extend_from_slice(script.as_bytes());
        }
    }
    out
}
