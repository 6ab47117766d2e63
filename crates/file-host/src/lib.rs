//! > A static file server for local game development
//!
//! `file-host` serves the contents of a single directory over HTTP. It
//! prioritizes small size and compile times over speed, scalability, or
//! security; it exists so a game's assets can be loaded from `http://`
//! instead of `file://` while developing.
//!
//! # Example
//!
//! ```rust,no_run
//! let path = std::env::current_dir().unwrap();
//! let server = file_host::Server::new(&path);
//!
//! println!("Serving {}", path.display());
//! println!("See http://localhost:{}", server.port());
//! println!("Hit CTRL-C to stop");
//!
//! server.serve().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::{
    net::ToSocketAddrs as _,
    path::{Component, Path, PathBuf},
    str::FromStr,
    sync::{RwLock, TryLockError},
};

/// The port served when none is given
pub const DEFAULT_PORT: u16 = 8000;

/// Custom server settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerBuilder {
    source: std::path::PathBuf,
    hostname: Option<String>,
    port: Option<u16>,
}

impl ServerBuilder {
    pub fn new(source: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source: source.into(),
            hostname: None,
            port: None,
        }
    }

    /// Override the hostname to bind
    ///
    /// By default, all interfaces are bound.
    pub fn hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Override the port
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Create a server
    pub fn build(&self) -> Server {
        let source = self.source.clone();
        let hostname = self.hostname.as_deref().unwrap_or("0.0.0.0").to_owned();
        let port = self.port.unwrap_or(DEFAULT_PORT);

        Server {
            source,
            hostname,
            port,
            server: RwLock::new(None),
        }
    }

    /// Start the webserver
    pub fn serve(&self) -> Result<(), Error> {
        self.build().serve()
    }
}

pub struct Server {
    source: std::path::PathBuf,
    hostname: String,
    port: u16,
    server: RwLock<Option<tiny_http::Server>>,
}

impl Server {
    /// Serve on the default port on all interfaces
    pub fn new(source: impl Into<std::path::PathBuf>) -> Self {
        ServerBuilder::new(source).build()
    }

    /// The location being served
    pub fn source(&self) -> &std::path::Path {
        self.source.as_path()
    }

    /// The address the server binds
    pub fn addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// The port the server binds
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the server was running at the instant the call happened
    pub fn is_running(&self) -> bool {
        matches!(self.server.read().as_deref(), Ok(Some(_)))
    }

    /// Reserve the listening socket without serving yet
    ///
    /// Callers that need to know the server is reachable before doing
    /// something else (like pointing a browser at it) can bind first and only
    /// then call [`Server::serve`], instead of guessing with a delay.
    ///
    /// The socket is created with `SO_REUSEADDR` so a quick stop/start cycle
    /// on the same port does not trip over `TIME_WAIT` connections.
    pub fn bind(&self) -> Result<(), Error> {
        match self.server.try_write().as_deref_mut() {
            Ok(server @ None) => {
                *server = Some(bound_server(&self.addr())?);
                Ok(())
            }
            Ok(Some(_)) | Err(TryLockError::WouldBlock) => {
                Err(Error::new("the server is already bound"))
            }
            Err(error @ TryLockError::Poisoned(_)) => Err(Error::new(error)),
        }
    }

    /// Start the webserver
    ///
    /// Blocks until [`Server::close`] is called from another thread. A bind
    /// failure is returned to the caller; a failure on an individual
    /// connection is logged and does not stop the loop.
    pub fn serve(&self) -> Result<(), Error> {
        match self.server.try_write().as_deref_mut() {
            Ok(server @ None) => {
                *server = Some(bound_server(&self.addr())?);
            }
            // `bind` was called ahead of time
            Ok(Some(_)) => {}
            Err(TryLockError::WouldBlock) => return Err(Error::new("the server is running")),
            Err(error @ TryLockError::Poisoned(_)) => return Err(Error::new(error)),
        }

        {
            let server = self.server.read().map_err(Error::new)?;
            // unwrap is safe here
            for request in server.as_ref().unwrap().incoming_requests() {
                // handles the request
                if let Err(e) = static_file_handler(self.source(), request) {
                    log::error!("{}", e);
                }
            }
        }

        *self.server.write().map_err(Error::new)? = None;

        Ok(())
    }

    /// Closes the server gracefully
    ///
    /// Unblocks the accept loop; the blocked [`Server::serve`] call then
    /// releases the socket and returns. Safe to call from a signal handler
    /// thread. A closed socket is never reused.
    pub fn close(&self) {
        if let Ok(Some(server)) = self.server.read().as_deref() {
            server.unblock();
        }
    }
}

/// Serve Error
#[derive(Debug)]
pub struct Error {
    message: String,
}

impl Error {
    fn new(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(fmt)
    }
}

impl std::error::Error for Error {}

fn bound_server(addr: &str) -> Result<tiny_http::Server, Error> {
    let addr = addr
        .to_socket_addrs()
        .map_err(Error::new)?
        .next()
        .ok_or_else(|| Error::new(format!("cannot resolve `{addr}`")))?;

    // `TcpListener::bind` leaves `SO_REUSEADDR` off, so build the socket by
    // hand to turn it on before binding.
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .map_err(Error::new)?;
    socket.set_reuse_address(true).map_err(Error::new)?;
    socket.bind(&addr.into()).map_err(Error::new)?;
    socket.listen(128).map_err(Error::new)?;

    let listener: std::net::TcpListener = socket.into();
    tiny_http::Server::from_listener(listener, None).map_err(Error::new)
}

fn static_file_handler(dest: &std::path::Path, req: tiny_http::Request) -> Result<(), Error> {
    match req.method() {
        tiny_http::Method::Get | tiny_http::Method::Head => {}
        _ => {
            return req
                .respond(
                    tiny_http::Response::from_string("")
                        .with_status_code(405)
                        .with_header(
                            tiny_http::Header::from_str("Allow: GET, HEAD")
                                .expect("formatted correctly"),
                        ),
                )
                .map_err(Error::new);
        }
    }

    let serve_path = local_path(dest, req.url()).map(|path| {
        if path.is_file() {
            path
        } else {
            // try to point the serve path into a "index.html" file in the
            // requested path
            path.join("index.html")
        }
    });

    // if the request points to a file and it exists, read and serve it
    if let Some(serve_path) = serve_path.filter(|p| p.is_file()) {
        let file = std::fs::File::open(&serve_path).map_err(Error::new)?;
        let mut response = tiny_http::Response::from_file(file);
        if let Some(mime) = mime_guess::MimeGuess::from_path(&serve_path).first_raw() {
            let content_type = format!("Content-Type:{}", mime);
            let content_type =
                tiny_http::Header::from_str(&content_type).expect("formatted correctly");
            response.add_header(content_type);
        }
        req.respond(response).map_err(Error::new)?;
    } else {
        // write a simple body for the 404 page
        req.respond(
            tiny_http::Response::from_string("<h1> <center> 404: Page not found </center> </h1>")
                .with_status_code(404)
                .with_header(
                    tiny_http::Header::from_str("Content-Type: text/html")
                        .expect("formatted correctly"),
                ),
        )
        .map_err(Error::new)?;
    }

    Ok(())
}

/// Map a request URL onto a path under `root`
///
/// Only plain path segments are accepted; `..` and anything else that could
/// step outside `root` yields `None`, which the handler turns into a 404.
fn local_path(root: &Path, url: &str) -> Option<PathBuf> {
    // strip off any querystrings so path.is_file() matches and doesn't stick
    // index.html on the end of the path (querystrings often used for
    // cachebusting)
    let url = url.split('?').next().unwrap_or(url);

    let mut path = root.to_path_buf();
    for part in url.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            _ => return None,
        }
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_maps_plain_segments() {
        let root = Path::new("/srv/game");
        assert_eq!(
            local_path(root, "/assets/script.js"),
            Some(PathBuf::from("/srv/game/assets/script.js"))
        );
    }

    #[test]
    fn local_path_root_is_root() {
        let root = Path::new("/srv/game");
        assert_eq!(local_path(root, "/"), Some(PathBuf::from("/srv/game")));
    }

    #[test]
    fn local_path_strips_query() {
        let root = Path::new("/srv/game");
        assert_eq!(
            local_path(root, "/script.js?v=12345"),
            Some(PathBuf::from("/srv/game/script.js"))
        );
    }

    #[test]
    fn local_path_ignores_redundant_separators() {
        let root = Path::new("/srv/game");
        assert_eq!(
            local_path(root, "//assets///./sprite.png"),
            Some(PathBuf::from("/srv/game/assets/sprite.png"))
        );
    }

    #[test]
    fn local_path_rejects_parent_segments() {
        let root = Path::new("/srv/game");
        assert_eq!(local_path(root, "/../etc/passwd"), None);
        assert_eq!(local_path(root, "/assets/../../etc/passwd"), None);
        assert_eq!(local_path(root, "/.."), None);
    }

    #[test]
    fn builder_defaults() {
        let server = ServerBuilder::new("/srv/game").build();
        assert_eq!(server.port(), DEFAULT_PORT);
        assert_eq!(server.addr(), "0.0.0.0:8000");
        assert!(!server.is_running());
    }

    #[test]
    fn builder_overrides() {
        let mut builder = ServerBuilder::new("/srv/game");
        builder.hostname("127.0.0.1").port(9123);
        let server = builder.build();
        assert_eq!(server.addr(), "127.0.0.1:9123");
        assert_eq!(server.source(), Path::new("/srv/game"));
    }
}
