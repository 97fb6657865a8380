use corridor_stream::ViewerPositionSource;

/// Walks the corridor at a constant speed, standing in for keyboard input.
#[derive(Clone, Debug)]
pub struct ScriptedWalker {
    position: f64,
    speed: f64,
}

impl ScriptedWalker {
    pub fn new(start: f64, speed: f64) -> Self {
        Self {
            position: start,
            speed,
        }
    }
}

impl ViewerPositionSource for ScriptedWalker {
    fn position(&mut self) -> f64 {
        let p = self.position;
        self.position += self.speed;
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_by_speed_each_sample() {
        let mut w = ScriptedWalker::new(1.0, 0.5);
        assert_eq!(w.position(), 1.0);
        assert_eq!(w.position(), 1.5);
        assert_eq!(w.position(), 2.0);
    }

    #[test]
    fn negative_speed_walks_backwards() {
        let mut w = ScriptedWalker::new(0.0, -2.0);
        w.position();
        assert_eq!(w.position(), -2.0);
    }
}
