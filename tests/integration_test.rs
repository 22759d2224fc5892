//! End-to-end tests against a local stub WHOIS server
//!
//! The stub speaks the real framing: it reads the request up to the
//! closing `end` line (or the client's half-close), writes a canned
//! response, and closes the connection so EOF terminates the client's
//! read loop.

use asnr::parse::ParseError;
use asnr::transport::{TcpTransport, TransportError, WhoisTransport};
use asnr::{AsnRecord, AsnResolver, ResolveError, ResolverConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Start a stub server that answers every connection with `response` and
/// reports each request payload on the returned channel.
async fn spawn_stub(response: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => {
                            request.extend_from_slice(&chunk[..n]);
                            if request.ends_with(b"end\r\n") {
                                break;
                            }
                        }
                        Err(_) => return,
                    }
                }
                let _ = tx.send(request);
                let _ = socket.write_all(response.as_bytes()).await;
                // Dropping the socket sends FIN; EOF ends the client read
            });
        }
    });

    (addr, rx)
}

fn config_for(addr: SocketAddr) -> ResolverConfig {
    ResolverConfig::builder()
        .whois_host("127.0.0.1")
        .whois_port(addr.port())
        .connect_timeout(Duration::from_millis(1_000))
        .exchange_timeout(Duration::from_millis(2_000))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_asn_batch_end_to_end() {
    let (addr, mut requests) =
        spawn_stub("Bulk mode; whois.cymru.com\r\nAS15169 GOOGLE - Google LLC, US\r\n").await;
    let resolver = AsnResolver::new(config_for(addr));

    let resolution = resolver
        .resolve_asns(&["15169", "99999999999"])
        .await
        .unwrap();

    assert_eq!(
        resolution.success,
        vec![AsnRecord::Resolved {
            as_number: 15169,
            organization: "GOOGLE - Google LLC".to_string(),
            country_code: "US".to_string(),
        }]
    );
    assert_eq!(resolution.error.len(), 1);
    assert_eq!(resolution.error[0].identifier, "99999999999");

    let request = requests.recv().await.unwrap();
    assert_eq!(request, b"begin\r\nas15169\r\nend\r\n");
}

#[tokio::test]
async fn test_asn_batch_with_unallocated_entry() {
    let (addr, _requests) = spawn_stub(
        "Bulk mode; whois.cymru.com\r\nAS15169 GOOGLE - Google LLC, US\r\nNO_NAME\r\n",
    )
    .await;
    let resolver = AsnResolver::new(config_for(addr));

    let resolution = resolver.resolve_asns(&["15169", "64496"]).await.unwrap();
    assert_eq!(resolution.success.len(), 2);
    assert_eq!(
        resolution.success[1],
        AsnRecord::Unallocated { as_number: 64496 }
    );
}

#[tokio::test]
async fn test_ip_bulk_end_to_end() {
    let (addr, mut requests) = spawn_stub(
        "Bulk mode; whois.cymru.com\r\n\
         15169   | 8.8.8.8          | 8.8.8.0/24          | US | arin | 2023-12-28 | AS15169 GOOGLE, US\r\n",
    )
    .await;
    let resolver = AsnResolver::new(config_for(addr));

    let resolution = resolver
        .resolve_ips(&["10.0.0.1", "8.8.8.8"])
        .await
        .unwrap();

    // Private address filtered locally; only the public one on the wire
    let request = requests.recv().await.unwrap();
    assert_eq!(request, b"verbose\r\nbegin\r\n8.8.8.8\r\nend\r\n");

    assert_eq!(resolution.success.len(), 1);
    assert_eq!(resolution.success[0].normalized, "8.8.8.0/24");
    assert_eq!(resolution.success[0].host_count, 254);
    assert_eq!(resolution.error.len(), 1);
    assert_eq!(resolution.error[0].address, "10.0.0.1");
}

#[tokio::test]
async fn test_empty_response_is_malformed() {
    // Server closes without writing anything
    let (addr, _requests) = spawn_stub("").await;
    let resolver = AsnResolver::new(config_for(addr));

    let err = resolver.resolve_asns(&["15169"]).await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Parse(ParseError::MalformedResponse)
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to find a port with no listener
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let resolver = AsnResolver::new(config_for(addr));
    let err = resolver.resolve_asns(&["15169"]).await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Transport(TransportError::Connect { .. })
    ));
}

#[tokio::test]
async fn test_unresolvable_host() {
    let config = ResolverConfig::builder()
        .whois_host("asnr-no-such-host.invalid")
        .connect_timeout(Duration::from_millis(2_000))
        .exchange_timeout(Duration::from_millis(2_000))
        .build()
        .unwrap();
    let transport = TcpTransport::new(config);

    let err = transport
        .exchange("begin\r\nend\r\n", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::AddressResolution { .. }));
}

#[tokio::test]
async fn test_exchange_timeout_on_silent_server() {
    // Accepts and reads but never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut chunk = [0u8; 1024];
                while let Ok(n) = socket.read(&mut chunk).await {
                    if n == 0 {
                        // Client half-closed; hold the socket open, say nothing
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        break;
                    }
                }
            });
        }
    });

    let config = ResolverConfig::builder()
        .whois_host("127.0.0.1")
        .whois_port(addr.port())
        .exchange_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let resolver = AsnResolver::new(config);

    let err = resolver.resolve_asns(&["15169"]).await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Transport(TransportError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_cancellation_releases_the_call() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut chunk = [0u8; 1024];
                while let Ok(n) = socket.read(&mut chunk).await {
                    if n == 0 {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        break;
                    }
                }
            });
        }
    });

    let config = ResolverConfig::builder()
        .whois_host("127.0.0.1")
        .whois_port(addr.port())
        .exchange_timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    let resolver = AsnResolver::new(config);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = resolver
        .resolve_asns_with_cancel(&["15169"], &token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Transport(TransportError::Cancelled)
    ));
}

#[tokio::test]
async fn test_concurrent_calls_share_nothing() {
    let (addr, _requests) =
        spawn_stub("Bulk mode; whois.cymru.com\r\nAS3356 LEVEL3 Org, US\r\n").await;
    let resolver = Arc::new(AsnResolver::new(config_for(addr)));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            resolver.resolve_asns(&["3356"]).await
        }));
    }
    for handle in handles {
        let resolution = handle.await.unwrap().unwrap();
        assert_eq!(resolution.success.len(), 1);
    }
}
