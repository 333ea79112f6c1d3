use std::io;
use std::net::{SocketAddr, UdpSocket};
use log::{debug, warn};

pub trait DatagramTransport {
    fn send_to(&self, payload: &[u8], destination: SocketAddr) -> io::Result<usize>;
}

pub trait TransportFactory {
    type Transport: DatagramTransport;

    fn open(&self) -> io::Result<Self::Transport>;
}

impl DatagramTransport for UdpSocket {
    fn send_to(&self, payload: &[u8], destination: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, payload, destination)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UdpFactory;

impl TransportFactory for UdpFactory {
    type Transport = UdpSocket;

    fn open(&self) -> io::Result<UdpSocket> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    // delivered by a fresh handle after the first attempt failed
    Resent,
    Dropped,
}

pub struct OutputChannel<F: TransportFactory> {
    factory: F,
    destination: SocketAddr,
    transport: Option<F::Transport>,
}

impl<F: TransportFactory> OutputChannel<F> {
    pub fn new(factory: F, destination: SocketAddr) -> Self {
        let transport = match factory.open() {
            Ok(transport) => Some(transport),
            Err(err) => {
                warn!("Failed to open output transport, will retry on first send: {}", err);
                None
            },
        };

        OutputChannel { factory, destination, transport }
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    fn try_send(&self, payload: &[u8]) -> io::Result<()> {
        match &self.transport {
            Some(transport) => transport.send_to(payload, self.destination).map(|_| ()),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "no output transport")),
        }
    }

    // on failure the transport is replaced and the send retried exactly once
    pub fn send(&mut self, text: &str) -> SendOutcome {
        let payload = text.as_bytes();

        let first_err = match self.try_send(payload) {
            Ok(()) => return SendOutcome::Sent,
            Err(err) => err,
        };

        debug!("Send to {} failed ({}), recreating transport", self.destination, first_err);
        self.transport = None;
        self.transport = match self.factory.open() {
            Ok(transport) => Some(transport),
            Err(err) => {
                debug!("Dropping message, could not reopen transport: {}", err);
                return SendOutcome::Dropped;
            },
        };

        match self.try_send(payload) {
            Ok(()) => SendOutcome::Resent,
            Err(err) => {
                debug!("Dropping message after retry: {}", err);
                SendOutcome::Dropped
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    // fails sends according to a script shared by every handle
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedFactory {
        pub failures: Rc<RefCell<VecDeque<bool>>>,
        pub delivered: Rc<RefCell<Vec<String>>>,
        pub opened: Rc<RefCell<usize>>,
    }

    pub(crate) struct ScriptedTransport {
        factory: ScriptedFactory,
    }

    impl DatagramTransport for ScriptedTransport {
        fn send_to(&self, payload: &[u8], _destination: SocketAddr) -> io::Result<usize> {
            let fail = self.factory.failures.borrow_mut().pop_front().unwrap_or(false);
            if fail {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "scripted failure"));
            }
            self.factory.delivered.borrow_mut().push(String::from_utf8_lossy(payload).into_owned());
            Ok(payload.len())
        }
    }

    impl TransportFactory for ScriptedFactory {
        type Transport = ScriptedTransport;

        fn open(&self) -> io::Result<ScriptedTransport> {
            *self.opened.borrow_mut() += 1;
            Ok(ScriptedTransport { factory: self.clone() })
        }
    }

    impl ScriptedFactory {
        pub fn failing(script: &[bool]) -> Self {
            let factory = ScriptedFactory::default();
            factory.failures.borrow_mut().extend(script.iter().copied());
            factory
        }
    }

    fn destination() -> SocketAddr {
        "127.0.0.1:2000".parse().unwrap()
    }

    #[test]
    fn sends_in_order() {
        let factory = ScriptedFactory::default();
        let mut channel = OutputChannel::new(factory.clone(), destination());

        assert_eq!(channel.send("a"), SendOutcome::Sent);
        assert_eq!(channel.send("b"), SendOutcome::Sent);
        assert_eq!(*factory.delivered.borrow(), vec!["a", "b"]);
        assert_eq!(*factory.opened.borrow(), 1);
    }

    #[test]
    fn retries_once_on_a_fresh_transport() {
        let factory = ScriptedFactory::failing(&[true, false]);
        let mut channel = OutputChannel::new(factory.clone(), destination());

        assert_eq!(channel.send("$WIHDM,1.0,M*\n"), SendOutcome::Resent);
        assert_eq!(*factory.delivered.borrow(), vec!["$WIHDM,1.0,M*\n"]);
        assert_eq!(*factory.opened.borrow(), 2);
    }

    #[test]
    fn drops_after_second_failure() {
        let factory = ScriptedFactory::failing(&[true, true]);
        let mut channel = OutputChannel::new(factory.clone(), destination());

        assert_eq!(channel.send("lost"), SendOutcome::Dropped);
        assert!(factory.delivered.borrow().is_empty());

        // the channel keeps working afterwards
        assert_eq!(channel.send("next"), SendOutcome::Sent);
        assert_eq!(*factory.delivered.borrow(), vec!["next"]);
    }

    #[test]
    fn udp_reaches_a_local_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut channel = OutputChannel::new(UdpFactory, listener.local_addr().unwrap());

        assert_eq!(channel.send("$WIMWV,1.0,R,2.0,N,A*\n"), SendOutcome::Sent);

        let mut buf = [0u8; 64];
        let (len, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"$WIMWV,1.0,R,2.0,N,A*\n");
    }
}
