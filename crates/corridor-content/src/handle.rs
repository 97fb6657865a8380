use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

/// Producer half of a one-shot value.
pub struct Resolver<T> {
    tx: Sender<T>,
}

/// Consumer half of a one-shot value; polled from the tick or selected on by the image lane.
pub struct Pending<T> {
    rx: Receiver<T>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Take<T> {
    Ready(T),
    Waiting,
    /// The resolver was dropped without producing a value.
    Abandoned,
}

pub fn pending<T>() -> (Resolver<T>, Pending<T>) {
    let (tx, rx) = bounded(1);
    (Resolver { tx }, Pending { rx })
}

impl<T> Resolver<T> {
    /// Returns false if nobody is listening any more.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

impl<T> Pending<T> {
    /// Already-resolved handle.
    pub fn ready(value: T) -> Self {
        let (resolver, pending) = pending();
        let _ = resolver.resolve(value);
        pending
    }

    /// Never blocks.
    pub fn try_take(&self) -> Take<T> {
        match self.rx.try_recv() {
            Ok(v) => Take::Ready(v),
            Err(TryRecvError::Empty) => Take::Waiting,
            Err(TryRecvError::Disconnected) => Take::Abandoned,
        }
    }

    /// Underlying channel, for multiplexing many handles with `crossbeam_channel::Select`.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending")
            .field("buffered", &self.rx.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_once_then_reports_abandoned() {
        let (r, p) = pending::<u32>();
        assert_eq!(p.try_take(), Take::Waiting);
        assert!(r.resolve(7));
        assert_eq!(p.try_take(), Take::Ready(7));
        assert_eq!(p.try_take(), Take::Abandoned);
    }

    #[test]
    fn dropped_resolver_is_abandoned() {
        let (r, p) = pending::<u32>();
        drop(r);
        assert_eq!(p.try_take(), Take::Abandoned);
        assert!(p.receiver().recv().is_err());
    }

    #[test]
    fn resolve_after_consumer_dropped_reports_false() {
        let (r, p) = pending::<u32>();
        drop(p);
        assert!(!r.resolve(1));
    }

    #[test]
    fn ready_handle_is_immediately_available() {
        let p = Pending::ready("x");
        assert_eq!(p.try_take(), Take::Ready("x"));
    }

    #[test]
    fn resolution_crosses_threads() {
        let (r, p) = pending::<String>();
        let t = std::thread::spawn(move || r.resolve("late".to_string()));
        assert_eq!(p.receiver().recv().as_deref(), Ok("late"));
        assert!(t.join().unwrap());
    }
}
