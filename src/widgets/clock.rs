//! `<z8-clock>`: live local time

use std::rc::Rc;
use std::time::Duration;

use crate::bridge::{Attributes, Island, Link};
use crate::capabilities::TimerHandle;
use crate::view::Node;

pub const TICK: Duration = Duration::from_millis(1000);

pub struct Clock {
    now: String,
    ticker: Option<TimerHandle>,
}

impl Island for Clock {
    const TAG: &'static str = "z8-clock";
    type Config = ();

    fn config(_attrs: &Attributes<'_>) {}

    fn create(link: &Link<Self>, _config: &()) -> Self {
        let clock = link.host().clock.clone();
        let tick_link = link.clone();
        let tick_clock = clock.clone();
        let ticker = clock.set_interval(
            TICK,
            Rc::new(move || {
                let now = tick_clock.local_time();
                tick_link.update(|this| this.now = now);
            }),
        );
        Clock {
            now: clock.local_time(),
            ticker: Some(ticker),
        }
    }

    fn view(&self, _config: &(), _link: &Link<Self>) -> Node {
        Node::el("span")
            .class("badge badge-ghost")
            .with_text(self.now.as_str())
    }

    fn unmount(&mut self) {
        self.ticker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::IslandElement;
    use crate::capabilities::memory::MemoryHost;
    use crate::dom::memory::MemoryElement;
    use crate::dom::DomElement;

    #[test]
    fn test_clock_ticks_every_second() {
        let mem = MemoryHost::new();
        let el = MemoryElement::new(Clock::TAG);
        let mut island = IslandElement::<Clock>::new(Rc::new(el.clone()), mem.host());
        island.connected();
        assert_eq!(el.text_content(), "12:00:00");

        mem.clock.advance(Duration::from_millis(999));
        assert_eq!(el.text_content(), "12:00:00");
        mem.clock.advance(Duration::from_millis(1));
        assert_eq!(el.text_content(), "12:00:01");
        mem.clock.advance(Duration::from_secs(59));
        assert_eq!(el.text_content(), "12:01:00");
    }

    #[test]
    fn test_disconnect_stops_ticking() {
        let mem = MemoryHost::new();
        let el = MemoryElement::new(Clock::TAG);
        let mut island = IslandElement::<Clock>::new(Rc::new(el.clone()), mem.host());
        island.connected();
        assert_eq!(mem.clock.pending(), 1);

        island.disconnected();
        assert_eq!(mem.clock.pending(), 0);
        let renders = el.ledger().renders();
        mem.clock.advance(Duration::from_secs(5));
        assert_eq!(el.ledger().renders(), renders);

        island.connected();
        assert_eq!(mem.clock.pending(), 1);
        assert_eq!(el.text_content(), "12:00:05");
    }
}
