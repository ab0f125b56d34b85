/// Fixed-step accumulator: frame deltas go in, whole simulation steps come out.
pub(crate) struct RuntimeLoop {
    accumulator: f32,
    fixed_dt: f32,
    max_backlog: f32,
}

pub(crate) struct RuntimeTick {
    pub dt: f32,
    pub dropped_backlog: Option<f32>,
}

impl RuntimeLoop {
    pub(crate) fn new(fixed_dt: f32, max_backlog: f32) -> Self {
        Self { accumulator: 0.0, fixed_dt, max_backlog: max_backlog.max(fixed_dt) }
    }

    pub(crate) fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub(crate) fn tick(&mut self, dt: f32) -> RuntimeTick {
        self.accumulator += dt.max(0.0);
        let mut dropped_backlog = None;
        if self.accumulator > self.max_backlog {
            dropped_backlog = Some(self.accumulator - self.max_backlog);
            self.accumulator = self.max_backlog;
        }
        RuntimeTick { dt, dropped_backlog }
    }

    pub(crate) fn pop_fixed_step(&mut self) -> Option<f32> {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            Some(self.fixed_dt)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_frames() {
        let mut runtime = RuntimeLoop::new(0.1, 1.0);
        runtime.tick(0.05);
        assert_eq!(runtime.pop_fixed_step(), None);
        runtime.tick(0.06);
        assert_eq!(runtime.pop_fixed_step(), Some(0.1));
        assert_eq!(runtime.pop_fixed_step(), None);
    }

    #[test]
    fn clamps_backlog() {
        let mut runtime = RuntimeLoop::new(0.1, 0.25);
        let tick = runtime.tick(2.0);
        assert!((tick.dropped_backlog.unwrap() - 1.75).abs() < 1e-6);
        let mut steps = 0;
        while runtime.pop_fixed_step().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 2);
    }
}
