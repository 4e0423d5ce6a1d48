//! Conversation state for one chat screen.
//!
//! [`ChatManager`] owns the message log and the typing flags and is the only
//! writer of either. Network round trips are simulated with [`ChatTask`]
//! entries on a virtual-time [`Scheduler`]; a task carries only message ids
//! and is resolved against the log when it fires, so a target that changed
//! or disappeared in the meantime is handled at that point.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::observers::{Observers, SubscriptionId};
use super::replies::ReplyPool;
use super::scheduler::{Scheduler, TimerId};
use crate::common::{
    ChatCommand, ChatEvent, ChatMessage, DeliveryState, MessageId, Participant, ScreenError,
    UserId,
};
use crate::config::AppConfig;

/// Deferred effects of the simulated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatTask {
    /// Move an outbound message to the configured settle state.
    Settle(MessageId),
    /// Append the next scripted reply from the remote participant.
    AutoReply,
    /// Typing indicator timed out.
    ClearTyping,
}

pub struct ChatManager {
    config: AppConfig,
    messages: Vec<ChatMessage>,
    typing: HashMap<UserId, bool>,
    replies: ReplyPool,
    scheduler: Scheduler<ChatTask>,
    /// Pending timeout of the latest typing signal.
    typing_clear: Option<TimerId>,
    pending_replies: usize,
    observers: Observers<ChatEvent>,
}

impl ChatManager {
    /// `epoch` is the wall-clock time of virtual time zero; message
    /// timestamps are derived from it.
    pub fn new(config: AppConfig, epoch: DateTime<Utc>) -> Self {
        let typing = [config.local_user.id.clone(), config.remote_user.id.clone()]
            .into_iter()
            .map(|id| (id, false))
            .collect();
        let replies = ReplyPool::new(config.replies.clone());

        Self {
            config,
            messages: Vec::new(),
            typing,
            replies,
            scheduler: Scheduler::new(epoch),
            typing_clear: None,
            pending_replies: 0,
            observers: Observers::default(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn typing(&self) -> &HashMap<UserId, bool> {
        &self.typing
    }

    pub fn is_typing(&self, user_id: &str) -> bool {
        self.typing.get(user_id).copied().unwrap_or(false)
    }

    pub fn local_user(&self) -> &Participant {
        &self.config.local_user
    }

    pub fn remote_user(&self) -> &Participant {
        &self.config.remote_user
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    pub fn has_pending_work(&self) -> bool {
        self.scheduler.pending() > 0
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChatEvent) + Send + 'static,
    {
        let id = self.observers.subscribe(callback);
        log::debug!("Chat observer subscribed ({} active)", self.observers.len());
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Appends an outbound message immediately in the `Sending` state and
    /// schedules its settling and the scripted reply.
    pub fn send_message(&mut self, text: impl Into<String>, reply_to: Option<MessageId>) -> MessageId {
        let reply_to = reply_to.filter(|target| {
            let known = self.message(*target).is_some();
            if !known {
                log::debug!("Dropping reply reference to unknown message {}", target.short());
            }
            known
        });

        let message = ChatMessage::new(
            text,
            &self.config.local_user,
            self.scheduler.wall_time(),
            DeliveryState::Sending,
            reply_to,
        );
        let id = message.id;
        self.append(message);

        self.scheduler
            .schedule(self.config.delivery_delay(), ChatTask::Settle(id));
        self.scheduler
            .schedule(self.config.reply_delay(), ChatTask::AutoReply);
        self.pending_replies += 1;

        log::info!(
            "Queued message {} (settles in {:?}, reply in {:?})",
            id.short(),
            self.config.delivery_delay(),
            self.config.reply_delay()
        );
        id
    }

    /// Raises or drops the remote participant's typing indicator. A new
    /// signal always replaces the timeout of the previous one.
    pub fn set_typing(&mut self, is_typing: bool) {
        if let Some(pending) = self.typing_clear.take() {
            self.scheduler.cancel(pending);
        }

        let remote = self.config.remote_user.id.clone();
        if is_typing {
            self.set_flag(&remote, true);
            let timer = self
                .scheduler
                .schedule(self.config.typing_timeout(), ChatTask::ClearTyping);
            self.typing_clear = Some(timer);
        } else {
            self.set_flag(&remote, false);
        }
    }

    /// Adds one `symbol` reaction. Returns `false` when the message is not in
    /// the log; nothing changes in that case.
    pub fn add_reaction(&mut self, message_id: MessageId, symbol: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) else {
            log::debug!("Ignoring reaction {symbol} on unknown message {}", message_id.short());
            return false;
        };
        message.add_reaction(symbol);
        let snapshot = message.clone();
        self.observers.notify(&ChatEvent::MessageUpdated(snapshot));
        true
    }

    pub fn apply(&mut self, command: ChatCommand) -> Result<(), ScreenError> {
        match command {
            ChatCommand::SendMessage { text, reply_to } => {
                self.send_message(text, reply_to);
            }
            ChatCommand::SetTyping(is_typing) => self.set_typing(is_typing),
            ChatCommand::AddReaction { message_id, symbol } => {
                if !self.add_reaction(message_id, &symbol) {
                    return Err(ScreenError::NotFound(format!(
                        "message {}",
                        message_id.short()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now().saturating_add(by);
        self.advance_to(target);
    }

    /// Fires every task due at or before `until`, including tasks scheduled
    /// by earlier tasks in the same window, then parks the clock at `until`.
    pub fn advance_to(&mut self, until: Duration) {
        while let Some((timer, task)) = self.scheduler.pop_due(until) {
            self.fire(timer, task);
        }
        self.scheduler.settle_at(until);
    }

    fn fire(&mut self, timer: TimerId, task: ChatTask) {
        log::trace!("Firing {task:?} at {:?}", timer.deadline());
        match task {
            ChatTask::Settle(id) => self.settle(id),
            ChatTask::AutoReply => {
                self.pending_replies = self.pending_replies.saturating_sub(1);
                self.append_reply();
                if self.pending_replies == 0 && self.typing_clear.is_none() {
                    let remote = self.config.remote_user.id.clone();
                    self.set_flag(&remote, false);
                }
            }
            ChatTask::ClearTyping => {
                if self.typing_clear == Some(timer) {
                    self.typing_clear = None;
                }
                let remote = self.config.remote_user.id.clone();
                self.set_flag(&remote, false);
                if self.config.reply_on_typing_timeout {
                    self.append_reply();
                }
            }
        }
    }

    fn settle(&mut self, id: MessageId) {
        let target = self.config.settle_state;
        let updated = match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => message.advance_state(target).then(|| message.clone()),
            None => {
                log::debug!("Message {} vanished before settling", id.short());
                None
            }
        };
        if let Some(snapshot) = updated {
            log::debug!("Message {} is now {target}", id.short());
            self.observers.notify(&ChatEvent::MessageUpdated(snapshot));
        }

        if self.config.typing_before_reply && self.pending_replies > 0 {
            let remote = self.config.remote_user.id.clone();
            self.set_flag(&remote, true);
        }
    }

    fn append_reply(&mut self) {
        let reply = ChatMessage::new(
            self.replies.next_reply(),
            &self.config.remote_user,
            self.scheduler.wall_time(),
            DeliveryState::Delivered,
            None,
        );
        log::info!("{} replied: {}", reply.sender_name, reply.content);
        self.append(reply);
    }

    fn append(&mut self, message: ChatMessage) {
        debug_assert!(self.message(message.id).is_none(), "duplicate message id");
        self.messages.push(message.clone());
        self.observers.notify(&ChatEvent::MessageAppended(message));
    }

    /// Returns whether the flag changed; unchanged writes publish nothing.
    fn set_flag(&mut self, user_id: &str, is_typing: bool) -> bool {
        let flag = self.typing.entry(user_id.to_string()).or_insert(false);
        if *flag == is_typing {
            return false;
        }
        *flag = is_typing;
        self.observers.notify(&ChatEvent::TypingChanged {
            user_id: user_id.to_string(),
            is_typing,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use proptest::prelude::*;

    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn config() -> AppConfig {
        AppConfig {
            replies: vec!["pong".to_string(), "sure".to_string()],
            ..AppConfig::default()
        }
    }

    fn manager_with(config: AppConfig) -> ChatManager {
        ChatManager::new(config, DateTime::<Utc>::UNIX_EPOCH)
    }

    fn manager() -> ChatManager {
        manager_with(config())
    }

    fn record(manager: &mut ChatManager) -> Arc<Mutex<Vec<ChatEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        manager.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[test]
    fn send_appends_synchronously_then_settles_then_replies() {
        let mut chat = manager();
        let id = chat.send_message("hi", None);

        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].content, "hi");
        assert_eq!(chat.messages()[0].state, DeliveryState::Sending);
        assert_eq!(chat.messages()[0].sender_id, "me");

        chat.advance(ms(999));
        assert_eq!(chat.message(id).unwrap().state, DeliveryState::Sending);
        chat.advance(ms(1));
        assert_eq!(chat.message(id).unwrap().state, DeliveryState::Delivered);
        assert_eq!(chat.messages().len(), 1);

        chat.advance(ms(2_000));
        assert_eq!(chat.messages().len(), 2);
        let reply = &chat.messages()[1];
        assert_eq!(reply.sender_id, "alex");
        assert_eq!(reply.sender_name, "Alex");
        assert!(ReplyPool::new(config().replies).contains(&reply.content));
        assert!(!chat.has_pending_work());
    }

    #[test]
    fn interleaved_sends_and_typing_settle_independently() {
        let mut chat = manager();
        let first = chat.send_message("hi", None);
        chat.set_typing(true);
        chat.advance(ms(500));
        let second = chat.send_message("again", None);
        chat.set_typing(false);

        chat.advance(ms(500));
        assert_eq!(chat.message(first).unwrap().state, DeliveryState::Delivered);
        assert_eq!(chat.message(second).unwrap().state, DeliveryState::Sending);

        chat.advance(ms(10_000));
        assert_eq!(chat.messages().len(), 4);
        assert_eq!(chat.message(second).unwrap().state, DeliveryState::Delivered);
        assert!(!chat.is_typing("alex"));
        assert!(!chat.has_pending_work());
    }

    #[test]
    fn settling_touches_only_the_due_message() {
        let mut chat = manager();
        let first = chat.send_message("a", None);
        chat.advance(ms(500));
        let second = chat.send_message("b", None);
        chat.advance(ms(500));

        assert_eq!(chat.message(first).unwrap().state, DeliveryState::Delivered);
        assert_eq!(chat.message(second).unwrap().state, DeliveryState::Sending);
    }

    #[test]
    fn messages_keep_call_order_and_unique_ids() {
        let mut chat = manager();
        let ids: Vec<_> = (0..10).map(|i| chat.send_message(format!("m{i}"), None)).collect();

        let contents: Vec<_> = chat.messages().iter().map(|m| m.content.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| format!("m{i}")).collect();
        assert_eq!(contents, expected);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10);
    }

    #[test]
    fn timestamps_follow_virtual_time() {
        let mut chat = manager();
        chat.advance(ms(2_500));
        let id = chat.send_message("later", None);
        let expected = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::milliseconds(2_500);
        assert_eq!(chat.message(id).unwrap().timestamp, expected);
    }

    #[test]
    fn typing_stopped_before_timeout_never_clears_later() {
        let mut chat = manager();
        let events = record(&mut chat);

        chat.set_typing(true);
        assert!(chat.is_typing("alex"));
        chat.advance(ms(1_000));
        chat.set_typing(false);
        assert!(!chat.is_typing("alex"));

        events.lock().unwrap().clear();
        chat.advance(ms(10_000));
        assert!(!chat.is_typing("alex"));
        assert!(events.lock().unwrap().is_empty());
        assert!(!chat.has_pending_work());
    }

    #[test]
    fn typing_clears_itself_after_timeout() {
        let mut chat = manager();
        chat.set_typing(true);
        chat.advance(ms(2_999));
        assert!(chat.is_typing("alex"));
        chat.advance(ms(1));
        assert!(!chat.is_typing("alex"));
    }

    #[test]
    fn fresh_typing_signal_supersedes_pending_clear() {
        let mut chat = manager();
        chat.set_typing(true);
        chat.advance(ms(2_000));
        chat.set_typing(true);
        chat.advance(ms(2_000));
        assert!(chat.is_typing("alex"), "first timeout must not clear the refreshed flag");
        chat.advance(ms(1_000));
        assert!(!chat.is_typing("alex"));
        assert_eq!(chat.typing().get("me"), Some(&false));
    }

    #[test]
    fn typing_timeout_can_trigger_reply() {
        let mut chat = manager_with(AppConfig {
            reply_on_typing_timeout: true,
            ..config()
        });
        chat.set_typing(true);
        chat.advance(ms(3_000));
        assert!(!chat.is_typing("alex"));
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].content, "pong");
    }

    #[test]
    fn remote_types_between_delivery_and_reply() {
        let mut chat = manager();
        chat.send_message("hi", None);
        assert!(!chat.is_typing("alex"));
        chat.advance(ms(1_000));
        assert!(chat.is_typing("alex"));
        chat.advance(ms(2_000));
        assert!(!chat.is_typing("alex"));
    }

    #[test]
    fn no_typing_before_reply_when_disabled() {
        let mut chat = manager_with(AppConfig {
            typing_before_reply: false,
            ..config()
        });
        let events = record(&mut chat);
        chat.send_message("hi", None);
        chat.advance(ms(5_000));
        assert!(
            !events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, ChatEvent::TypingChanged { .. }))
        );
    }

    #[test]
    fn reactions_count_independently() {
        let mut chat = manager();
        let id = chat.send_message("hi", None);
        assert!(chat.add_reaction(id, "👍"));
        assert!(chat.add_reaction(id, "👍"));
        assert!(chat.add_reaction(id, "🎉"));

        let reactions = &chat.message(id).unwrap().reactions;
        assert_eq!(reactions.get("👍"), Some(&2));
        assert_eq!(reactions.get("🎉"), Some(&1));
    }

    #[test]
    fn reacting_to_unknown_message_is_a_no_op() {
        let mut chat = manager();
        chat.send_message("hi", None);
        let before = chat.messages().to_vec();
        let events = record(&mut chat);

        assert!(!chat.add_reaction(MessageId::new(), "👍"));
        assert_eq!(chat.messages(), before.as_slice());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn apply_reports_missing_reaction_target() {
        let mut chat = manager();
        let missing = MessageId::new();
        let result = chat.apply(ChatCommand::AddReaction {
            message_id: missing,
            symbol: "👍".to_string(),
        });
        assert_eq!(
            result,
            Err(ScreenError::NotFound(format!("message {}", missing.short())))
        );
        assert!(chat.apply(ChatCommand::SetTyping(true)).is_ok());
        assert!(chat.is_typing("alex"));
    }

    #[test]
    fn reply_reference_must_exist() {
        let mut chat = manager();
        let original = chat.send_message("question", None);
        let answer = chat.send_message("follow-up", Some(original));
        let orphan = chat.send_message("orphan", Some(MessageId::new()));

        assert_eq!(chat.message(answer).unwrap().reply_to, Some(original));
        assert_eq!(chat.message(orphan).unwrap().reply_to, None);
    }

    #[test]
    fn settle_policy_is_configurable() {
        let mut chat = manager_with(AppConfig {
            settle_state: DeliveryState::Read,
            ..config()
        });
        let id = chat.send_message("hi", None);
        chat.advance(ms(1_000));
        assert_eq!(chat.message(id).unwrap().state, DeliveryState::Read);
    }

    #[test]
    fn observers_see_changes_in_order() {
        let mut chat = manager();
        let events = record(&mut chat);
        let id = chat.send_message("hi", None);
        chat.advance(ms(3_000));

        let events = events.lock().unwrap();
        assert!(matches!(&events[0], ChatEvent::MessageAppended(m) if m.id == id));
        assert!(
            matches!(&events[1], ChatEvent::MessageUpdated(m) if m.state == DeliveryState::Delivered)
        );
        assert_eq!(
            events[2],
            ChatEvent::TypingChanged {
                user_id: "alex".to_string(),
                is_typing: true
            }
        );
        assert!(matches!(&events[3], ChatEvent::MessageAppended(m) if m.content == "pong"));
        assert_eq!(
            events[4],
            ChatEvent::TypingChanged {
                user_id: "alex".to_string(),
                is_typing: false
            }
        );
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn unsubscribed_observer_is_silent() {
        let mut chat = manager();
        let events = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&events);
        let sub = chat.subscribe(move |_| *sink.lock().unwrap() += 1);
        chat.send_message("one", None);
        assert!(chat.unsubscribe(sub));
        chat.send_message("two", None);
        chat.advance(ms(10_000));
        assert_eq!(*events.lock().unwrap(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Send(String),
        Typing(bool),
        React(usize, &'static str),
        Advance(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(Op::Send),
            any::<bool>().prop_map(Op::Typing),
            (0usize..16, prop::sample::select(vec!["👍", "❤️", "😂"]))
                .prop_map(|(index, symbol)| Op::React(index, symbol)),
            (0u64..4_000).prop_map(Op::Advance),
        ]
    }

    proptest! {
        #[test]
        fn log_invariants_hold_for_any_operation_sequence(ops in prop::collection::vec(op(), 1..60)) {
            let mut chat = manager();
            let mut sent = Vec::new();
            let mut states: HashMap<MessageId, DeliveryState> = HashMap::new();

            for op in ops {
                match op {
                    Op::Send(text) => sent.push((chat.send_message(text.clone(), None), text)),
                    Op::Typing(flag) => chat.set_typing(flag),
                    Op::React(index, symbol) => {
                        if let Some(id) = chat.messages().get(index).map(|m| m.id) {
                            prop_assert!(chat.add_reaction(id, symbol));
                        }
                    }
                    Op::Advance(millis) => chat.advance(ms(millis)),
                }

                for message in chat.messages() {
                    if let Some(previous) = states.insert(message.id, message.state) {
                        prop_assert!(message.state >= previous, "state moved backward");
                    }
                }
            }

            let ids: HashSet<_> = chat.messages().iter().map(|m| m.id).collect();
            prop_assert_eq!(ids.len(), chat.messages().len());

            let outbound: Vec<_> = chat
                .messages()
                .iter()
                .filter(|m| m.sender_id == "me")
                .map(|m| (m.id, m.content.clone()))
                .collect();
            prop_assert_eq!(&outbound, &sent);

            chat.advance(Duration::from_secs(60));
            prop_assert!(!chat.has_pending_work());
            prop_assert!(chat.typing().values().all(|flag| !flag));
            prop_assert!(chat
                .messages()
                .iter()
                .filter(|m| m.sender_id == "me")
                .all(|m| m.state == DeliveryState::Delivered));
            let replies = chat.messages().iter().filter(|m| m.sender_id == "alex").count();
            prop_assert_eq!(replies, sent.len());
        }
    }
}
