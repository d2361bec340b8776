//! Opening the dashboard in the desktop browser

use std::io;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

fn launcher(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("rundll32");
        c.arg("url.dll,FileProtocolHandler");
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

/// Launch the platform URL handler. Failures are logged, never fatal.
pub fn open_in_browser(url: &str) -> io::Result<()> {
    match launcher(url).spawn() {
        Ok(_) => {
            debug!("Opened {} in browser", url);
            Ok(())
        }
        Err(e) => {
            warn!("Could not open browser for {}: {}", url, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_passes_url_last() {
        let cmd = launcher("http://localhost:8080");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args.last().map(|a| a.to_string_lossy().into_owned()).as_deref(), Some("http://localhost:8080"));
    }
}
