use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

mod config;
mod handler;
mod logger;
mod response;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Bad configuration (e.g. non-numeric PORT) aborts here, before any
    // request is served.
    let settings = config::resolve(None)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(settings))
}

async fn serve(settings: config::Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = settings.socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    logger::log_server_start(&settings, &addr);

    let router = Arc::new(handler::Router::new(Arc::new(settings)));

    loop {
        let (stream, _peer_addr) = listener.accept().await?;
        let router = Arc::clone(&router);

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let response = router.handle(&req);
                std::future::ready(Ok::<_, Infallible>(response))
            });

            if let Err(err) = http1::Builder::new()
                .keep_alive(true)
                .serve_connection(io, service)
                .await
            {
                eprintln!("[Error] Failed to serve connection: {err:?}");
            }
        });
    }
}

/// Create a `TcpListener` with SO_REUSEPORT and SO_REUSEADDR enabled, so a
/// replacement process can bind while the old port lingers in TIME_WAIT.
fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
