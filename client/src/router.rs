//! Reply correlation for in-flight requests.
//!
//! The router holds one entry per pending request and decides, for each
//! inbound event, which waiter (if any) it answers. It does no I/O, so the
//! matching rules are tested directly.
//!
//! MATCHING ORDER
//! ==============
//! 1. An echoed `requestId` wins. An id that matches nothing is stale (its
//!    request timed out or was cancelled); it is never re-matched by action
//!    and never surfaces as an unsolicited event.
//! 2. An error naming an `action` goes to the oldest request sent with that
//!    action or expecting it as a reply.
//! 3. Any other event goes to the oldest request expecting its action.
//! 4. An error with neither id nor action goes to the only pending request,
//!    if exactly one is pending.
//!
//! Everything else without an id is unsolicited.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::collections::VecDeque;

use frames::{Command, Event, Inbound};

#[derive(Debug)]
struct Pending<W> {
    request_id: String,
    action: &'static str,
    reply_action: Option<&'static str>,
    waiter: W,
}

/// What an inbound event turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Resolution<W> {
    /// The reply to a pending request.
    Reply(W),
    /// Carries a `requestId` nobody is waiting for any more.
    Stale(String),
    /// Carries no `requestId` and matched nothing.
    Unsolicited,
}

impl<W> Resolution<W> {
    fn from_match(waiter: Option<W>) -> Self {
        waiter.map_or(Self::Unsolicited, Self::Reply)
    }
}

/// Pending-request table, oldest first.
#[derive(Debug)]
pub(crate) struct Router<W> {
    pending: VecDeque<Pending<W>>,
}

impl<W> Default for Router<W> {
    fn default() -> Self {
        Self { pending: VecDeque::new() }
    }
}

impl<W> Router<W> {
    pub(crate) fn register(&mut self, request_id: impl Into<String>, command: &Command, waiter: W) {
        self.pending.push_back(Pending {
            request_id: request_id.into(),
            action: command.action(),
            reply_action: command.reply_action(),
            waiter,
        });
    }

    /// Take the waiter `inbound` answers, if any.
    pub(crate) fn resolve(&mut self, inbound: &Inbound) -> Resolution<W> {
        if let Some(id) = &inbound.request_id {
            return match self.take_where(|p| &p.request_id == id) {
                Some(waiter) => Resolution::Reply(waiter),
                None => Resolution::Stale(id.clone()),
            };
        }
        Resolution::from_match(self.match_by_action(&inbound.event))
    }

    fn match_by_action(&mut self, event: &Event) -> Option<W> {
        match event {
            Event::Error { action: Some(action), .. } => {
                self.take_where(|p| p.action == action.as_str() || p.reply_action == Some(action.as_str()))
            }
            Event::Error { action: None, .. } => {
                if self.pending.len() == 1 {
                    self.pending.pop_front().map(|p| p.waiter)
                } else {
                    None
                }
            }
            event => {
                let action = event.action()?;
                self.take_where(|p| p.reply_action == Some(action))
            }
        }
    }

    /// Forget a request, e.g. after its timeout fired or its caller gave up.
    pub(crate) fn remove(&mut self, request_id: &str) -> Option<W> {
        self.take_where(|p| p.request_id == request_id)
    }

    /// Drop every pending request; used when the connection goes away.
    pub(crate) fn drain(&mut self) -> Vec<W> {
        self.pending.drain(..).map(|p| p.waiter).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    fn take_where(&mut self, pred: impl Fn(&Pending<W>) -> bool) -> Option<W> {
        let index = self.pending.iter().position(pred)?;
        self.pending.remove(index).map(|p| p.waiter)
    }
}
