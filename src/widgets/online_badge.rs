//! `<z8-online-badge>`

use std::rc::Rc;

use crate::bridge::{Attributes, Island, Link};
use crate::capabilities::Subscription;
use crate::view::Node;

/// Badge classes and text for a connectivity state
pub fn badge(online: bool) -> (&'static str, &'static str) {
    if online {
        ("badge badge-success", "Online")
    } else {
        ("badge badge-error", "Offline")
    }
}

pub struct OnlineBadge {
    online: bool,
    _subscription: Subscription,
}

impl Island for OnlineBadge {
    const TAG: &'static str = "z8-online-badge";
    type Config = ();

    fn config(_attrs: &Attributes<'_>) {}

    fn create(link: &Link<Self>, _config: &()) -> Self {
        let connectivity = link.host().connectivity.clone();
        let update_link = link.clone();
        let subscription = connectivity.subscribe(Rc::new(move |online| {
            update_link.update(|this| this.online = online);
        }));
        OnlineBadge {
            online: connectivity.is_online(),
            _subscription: subscription,
        }
    }

    fn view(&self, _config: &(), _link: &Link<Self>) -> Node {
        let (class, text) = badge(self.online);
        Node::el("span").class(class).with_text(text)
    }
}
