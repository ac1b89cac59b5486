//! Trait abstraction for datagram socket operations to enable testing

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Trait for connectionless datagram I/O
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// Send one datagram to `target`
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Receive one datagram into `buf`
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

#[async_trait]
impl DatagramTransport for UdpSocket {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, payload, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }
}
