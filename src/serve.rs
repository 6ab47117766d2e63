use std::sync::Arc;
use std::thread;

use anyhow::Context as _;

use crate::args::Args;

pub(crate) fn run(args: &Args) -> anyhow::Result<()> {
    let root = match &args.root {
        Some(root) => dunce::canonicalize(root)
            .with_context(|| format!("failed to resolve root `{}`", root.display()))?,
        None => exe_dir()?,
    };
    log::debug!("Serving {}", root.display());

    let mut builder = file_host::ServerBuilder::new(root);
    builder.port(args.port);
    let server = Arc::new(builder.build());

    // bind up front so "address in use" aborts before anything prints and so
    // the browser below never races the listener
    server
        .bind()
        .with_context(|| format!("failed to start the server on port {}", args.port))?;

    // in place before the banner invites the operator to press Ctrl+C
    ctrlc::set_handler({
        let server = Arc::clone(&server);
        move || server.close()
    })
    .context("failed to install the Ctrl+C handler")?;

    println!(
        "Flappy Bird Web Server started at http://localhost:{}",
        args.port
    );
    println!("Press Ctrl+C to stop the server");

    if !args.no_open {
        let url = format!("http://localhost:{}/", args.port);
        thread::spawn(move || open_browser(url));
    }

    server.serve()?;

    // the accept loop only ends on Ctrl+C
    println!();
    println!("Server stopped.");

    Ok(())
}

fn exe_dir() -> anyhow::Result<std::path::PathBuf> {
    let exe = std::env::current_exe().context("failed to locate this executable")?;
    let dir = exe
        .parent()
        .context("this executable has no parent directory")?;
    Ok(dunce::canonicalize(dir)?)
}

/// Best-effort; the server must keep serving whether or not a browser exists
fn open_browser(url: String) {
    match open::that(&url) {
        Ok(()) => log::info!("Please check your browser!"),
        Err(why) => log::debug!("Failed to open a browser: {}", why),
    }
}
