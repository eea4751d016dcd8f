use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use applify_domain::{
    answers_to_value, Answers, Error, Plugin, PluginConfig, Question, QuestionArgs, QuestionKind,
    Renderer,
};
use applify_pipe::{Event, Pipe, Subscription};
use serde_json::Value;
use tracing::debug;

pub const PROMPT_CHANNEL: &str = "prompt";
pub const QUESTION_EVENT: &str = "question";
pub const ASK_EVENT: &str = "ask";
pub const RESPONSE_EVENT: &str = "response";

#[derive(Default)]
struct State {
    config: PluginConfig,
    pipe: Pipe,
    questions: Vec<Question>,
    answers: Answers,
    subscriptions: Vec<Subscription>,
}

struct Inner<R> {
    renderer: R,
    state: Mutex<State>,
    // Held from snapshot to stored answers so overlapping asks render one after another.
    cycle: tokio::sync::Mutex<()>,
}

impl<R> Inner<R> {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collects questions from other plugins over the `prompt` channel and asks
/// them in one batch.
///
/// Listens for `question` (queue a question) and `ask` (run a prompt cycle)
/// and publishes `response` with the collected answers.
///
/// ```ignore
/// let plugin = PromptPlugin::new(InquireRenderer::new());
/// let pipe = Pipe::new();
/// plugin.init(PluginConfig::default(), pipe.clone()).await?;
///
/// let prompt = pipe.channel(PROMPT_CHANNEL).unwrap();
/// prompt.on(RESPONSE_EVENT, |event| async move { println!("{}", event.value); Ok(()) });
/// prompt.emit(QUESTION_EVENT, json!(["city", "City?"])).await?;
/// prompt.emit(ASK_EVENT, Value::Null).await?;
/// ```
pub struct PromptPlugin<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for PromptPlugin<R> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<R: Renderer + 'static> PromptPlugin<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                renderer,
                state: Mutex::new(State::default()),
                cycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Queues a question for the next prompt cycle. Duplicate names are
    /// queued and asked again.
    pub fn add_question(
        &self,
        name: impl ToString,
        message: impl ToString,
        kind: Option<QuestionKind>,
        default: Option<Value>,
        choices: Option<Vec<Value>>,
    ) {
        self.add_question_args(QuestionArgs {
            name: name.to_string(),
            message: message.to_string(),
            kind,
            default,
            choices,
        });
    }

    pub fn add_question_args(&self, args: QuestionArgs) {
        let question = Question::from(args);
        debug!(name = %question.name, kind = %question.kind, "Queueing question");
        self.inner.state().questions.push(question);
    }

    /// Asks every queued question, publishes the answers as `response`, then
    /// empties the queue.
    ///
    /// Waits for any render already running on this plugin. The renderer is
    /// called even when nothing is queued. On renderer failure the queue and
    /// the previous answers are left as they were; if publishing fails the
    /// queue is left as well.
    pub async fn prompt(&self) -> anyhow::Result<()> {
        let (answers, channel) = {
            let _cycle = self.inner.cycle.lock().await;
            let questions = self.inner.state().questions.clone();
            debug!(questions = questions.len(), "Starting prompt cycle");

            let answers = self.inner.renderer.render(&questions).await?;

            let mut state = self.inner.state();
            state.answers = answers.clone();
            let channel = state
                .pipe
                .channel(PROMPT_CHANNEL)
                .ok_or_else(|| Error::MissingChannel(PROMPT_CHANNEL.to_string()))?;
            (answers, channel)
        };

        debug!(answers = answers.len(), "Publishing response");
        channel
            .emit(RESPONSE_EVENT, answers_to_value(&answers))
            .await?;

        self.inner.state().questions.clear();
        Ok(())
    }

    pub fn questions(&self) -> Vec<Question> {
        self.inner.state().questions.clone()
    }

    pub fn answers(&self) -> Answers {
        self.inner.state().answers.clone()
    }

    pub fn config(&self) -> PluginConfig {
        self.inner.state().config.clone()
    }

    /// Removes the handlers registered by [`Plugin::init`]. The handlers keep
    /// the plugin alive until then.
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut self.inner.state().subscriptions);
        for subscription in subscriptions {
            subscription.dispose();
        }
    }

    fn subscribe(&self, pipe: &Pipe) -> Vec<Subscription> {
        let channel = pipe.get_or_create(PROMPT_CHANNEL);

        let plugin = self.clone();
        let question = channel.on(QUESTION_EVENT, move |event: Event| {
            plugin.add_question_args(QuestionArgs::from_payload(event.value));
            async { Ok(()) }
        });

        let plugin = self.clone();
        let ask = channel.on(ASK_EVENT, move |_| {
            let plugin = plugin.clone();
            async move { plugin.prompt().await }
        });

        vec![question, ask]
    }
}

#[async_trait::async_trait]
impl<R: Renderer + 'static> Plugin for PromptPlugin<R> {
    /// Stores the config and pipe, creating the `prompt` channel if the pipe
    /// has none, and subscribes to `question` and `ask`. Handlers from an
    /// earlier `init` are removed first.
    async fn init(&self, config: PluginConfig, pipe: Pipe) -> anyhow::Result<()> {
        self.dispose();
        let subscriptions = self.subscribe(&pipe);

        let mut state = self.inner.state();
        state.config = config;
        state.pipe = pipe;
        state.subscriptions = subscriptions;
        Ok(())
    }

    fn pipe(&self) -> Pipe {
        self.inner.state().pipe.clone()
    }

    /// Replaces the stored pipe. Subscriptions stay on the channel they were
    /// made on; call `init` to listen on the new pipe.
    fn set_pipe(&self, pipe: Pipe) {
        self.inner.state().pipe = pipe;
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use applify_pipe::Channel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct StubRenderer {
        calls: Mutex<Vec<Vec<Question>>>,
        results: Mutex<VecDeque<anyhow::Result<Answers>>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl StubRenderer {
        fn answering(answers: Value) -> Self {
            let stub = Self::default();
            stub.push(Ok(to_answers(answers)));
            stub
        }

        fn push(&self, result: anyhow::Result<Answers>) {
            self.results.lock().unwrap().push_back(result);
        }
    }

    #[async_trait::async_trait]
    impl Renderer for StubRenderer {
        async fn render(&self, questions: &[Question]) -> anyhow::Result<Answers> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            self.calls.lock().unwrap().push(questions.to_vec());

            for _ in 0..3 {
                tokio::task::yield_now().await;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            let next = self.results.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(Answers::new()))
        }
    }

    fn to_answers(value: Value) -> Answers {
        serde_json::from_value(value).unwrap()
    }

    fn fixture(renderer: StubRenderer) -> PromptPlugin<StubRenderer> {
        PromptPlugin::new(renderer)
    }

    fn prompt_channel(plugin: &PromptPlugin<StubRenderer>) -> Channel {
        plugin.pipe().channel(PROMPT_CHANNEL).unwrap()
    }

    fn capture_responses(channel: &Channel) -> Arc<Mutex<Vec<Value>>> {
        let responses = Arc::new(Mutex::new(Vec::new()));
        let sink = responses.clone();
        channel.on(RESPONSE_EVENT, move |event: Event| {
            sink.lock().unwrap().push(event.value);
            async { Ok(()) }
        });
        responses
    }

    #[test]
    fn test_new_plugin_is_empty() {
        let plugin = fixture(StubRenderer::default());

        assert_eq!(plugin.questions(), Vec::<Question>::new());
        assert_eq!(plugin.answers(), Answers::new());
    }

    #[tokio::test]
    async fn test_init_creates_prompt_channel() {
        let plugin = fixture(StubRenderer::default());
        let pipe = Pipe::new();

        plugin.init(PluginConfig::default(), pipe.clone()).await.unwrap();

        assert!(pipe.contains(PROMPT_CHANNEL));
        assert!(plugin.pipe().ptr_eq(&pipe));
    }

    #[tokio::test]
    async fn test_init_reuses_existing_prompt_channel() {
        let plugin = fixture(StubRenderer::default());
        let channel = Channel::new();
        let pipe = Pipe::new().with_channel(PROMPT_CHANNEL, channel.clone());

        plugin.init(PluginConfig::default(), pipe).await.unwrap();

        assert!(prompt_channel(&plugin).ptr_eq(&channel));
    }

    #[tokio::test]
    async fn test_init_stores_config() {
        let plugin = fixture(StubRenderer::default());
        let config = PluginConfig::new(json!({"theme": "dark"}));

        plugin.init(config.clone(), Pipe::new()).await.unwrap();

        assert_eq!(plugin.config(), config);
    }

    #[tokio::test]
    async fn test_question_event_with_defaults() {
        let plugin = fixture(StubRenderer::default());
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();

        prompt_channel(&plugin)
            .emit(QUESTION_EVENT, json!(["value", "Is this a test:"]))
            .await
            .unwrap();

        let actual = serde_json::to_value(plugin.questions()).unwrap();
        let expected = json!([{
            "name": "value",
            "message": "Is this a test:",
            "type": "input",
            "choices": []
        }]);
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_question_event_with_all_args() {
        let plugin = fixture(StubRenderer::default());
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();

        prompt_channel(&plugin)
            .emit(QUESTION_EVENT, json!(["ok", "Confirm?", "confirm", true, []]))
            .await
            .unwrap();

        let actual = serde_json::to_value(plugin.questions()).unwrap();
        let expected = json!([{
            "name": "ok",
            "message": "Confirm?",
            "type": "confirm",
            "default": true,
            "choices": []
        }]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_add_question_keeps_order_and_duplicates() {
        let plugin = fixture(StubRenderer::default());

        plugin.add_question("a", "A?", None, None, None);
        plugin.add_question("b", "B?", Some(QuestionKind::Confirm), None, None);
        plugin.add_question("a", "A again?", None, None, None);

        let names: Vec<_> = plugin.questions().into_iter().map(|q| q.name).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_ask_prompts_and_publishes_response() {
        let plugin = fixture(StubRenderer::answering(json!({"city": "Lyon"})));
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        let responses = capture_responses(&channel);

        channel
            .emit(QUESTION_EVENT, json!(["city", "City?"]))
            .await
            .unwrap();
        channel.emit(ASK_EVENT, Value::Null).await.unwrap();

        assert_eq!(*responses.lock().unwrap(), vec![json!({"city": "Lyon"})]);
        assert_eq!(plugin.questions().len(), 0);
        assert_eq!(plugin.answers(), to_answers(json!({"city": "Lyon"})));
        let calls = plugin.inner.renderer.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![vec![Question::new("city", "City?")]]);
    }

    #[tokio::test]
    async fn test_ask_with_empty_queue_still_renders() {
        let plugin = fixture(StubRenderer::default());
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        let responses = capture_responses(&channel);

        channel.emit(ASK_EVENT, Value::Null).await.unwrap();

        let calls = plugin.inner.renderer.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![Vec::<Question>::new()]);
        assert_eq!(*responses.lock().unwrap(), vec![json!({})]);
    }

    #[tokio::test]
    async fn test_answers_are_replaced_each_cycle() {
        let renderer = StubRenderer::answering(json!({"a": 1}));
        renderer.push(Ok(to_answers(json!({"b": 2}))));
        let plugin = fixture(renderer);
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();

        plugin.prompt().await.unwrap();
        plugin.prompt().await.unwrap();

        assert_eq!(plugin.answers(), to_answers(json!({"b": 2})));
    }

    #[tokio::test]
    async fn test_renderer_failure_keeps_queue() {
        let renderer = StubRenderer::default();
        renderer.push(Err(anyhow::anyhow!("terminal closed")));
        let plugin = fixture(renderer);
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        let responses = capture_responses(&channel);
        plugin.add_question("city", "City?", None, None, None);

        let error = channel.emit(ASK_EVENT, Value::Null).await.unwrap_err();

        assert_eq!(error.to_string(), "terminal closed");
        assert_eq!(plugin.questions(), vec![Question::new("city", "City?")]);
        assert_eq!(plugin.answers(), Answers::new());
        assert!(responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reinit_does_not_double_subscribe() {
        let plugin = fixture(StubRenderer::default());
        let pipe = Pipe::new();

        plugin.init(PluginConfig::default(), pipe.clone()).await.unwrap();
        plugin.init(PluginConfig::default(), pipe.clone()).await.unwrap();

        let channel = pipe.channel(PROMPT_CHANNEL).unwrap();
        assert_eq!(channel.listener_count(QUESTION_EVENT), 1);
        assert_eq!(channel.listener_count(ASK_EVENT), 1);

        channel
            .emit(QUESTION_EVENT, json!(["city", "City?"]))
            .await
            .unwrap();
        assert_eq!(plugin.questions().len(), 1);
    }

    #[tokio::test]
    async fn test_dispose_stops_listening() {
        let plugin = fixture(StubRenderer::default());
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);

        plugin.dispose();
        channel
            .emit(QUESTION_EVENT, json!(["city", "City?"]))
            .await
            .unwrap();

        assert_eq!(channel.listener_count(ASK_EVENT), 0);
        assert!(plugin.questions().is_empty());
    }

    #[tokio::test]
    async fn test_set_pipe_replaces_pipe_without_rewiring() {
        let plugin = fixture(StubRenderer::default());
        let original = Pipe::new();
        plugin.init(PluginConfig::default(), original.clone()).await.unwrap();
        let replacement = Pipe::new();

        plugin.set_pipe(replacement.clone());

        assert!(plugin.pipe().ptr_eq(&replacement));
        assert!(!replacement.contains(PROMPT_CHANNEL));
        let channel = original.channel(PROMPT_CHANNEL).unwrap();
        assert_eq!(channel.listener_count(QUESTION_EVENT), 1);
    }

    #[tokio::test]
    async fn test_ask_after_set_pipe_without_channel_fails() {
        let plugin = fixture(StubRenderer::answering(json!({"city": "Lyon"})));
        let original = Pipe::new();
        plugin.init(PluginConfig::default(), original.clone()).await.unwrap();
        plugin.add_question("city", "City?", None, None, None);
        plugin.set_pipe(Pipe::new());

        let error = original
            .channel(PROMPT_CHANNEL)
            .unwrap()
            .emit(ASK_EVENT, Value::Null)
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::MissingChannel(name)) if name == PROMPT_CHANNEL
        ));
        assert_eq!(plugin.questions().len(), 1);
        assert_eq!(plugin.answers(), to_answers(json!({"city": "Lyon"})));
    }

    #[tokio::test]
    async fn test_overlapping_asks_run_serially() {
        let plugin = fixture(StubRenderer::default());
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        plugin.add_question("city", "City?", None, None, None);

        let (first, second) = tokio::join!(
            channel.emit(ASK_EVENT, Value::Null),
            channel.emit(ASK_EVENT, Value::Null)
        );
        first.unwrap();
        second.unwrap();

        let renderer = &plugin.inner.renderer;
        assert_eq!(renderer.max_active.load(Ordering::SeqCst), 1);
        let calls = renderer.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![vec![Question::new("city", "City?")], vec![]]);
    }

    #[tokio::test]
    async fn test_handlers_keep_plugin_alive_after_handle_drop() {
        let pipe = Pipe::new();
        {
            let plugin = fixture(StubRenderer::answering(json!({"a": "yes"})));
            plugin.init(PluginConfig::default(), pipe.clone()).await.unwrap();
        }
        let channel = pipe.channel(PROMPT_CHANNEL).unwrap();
        let responses = capture_responses(&channel);

        channel.emit(QUESTION_EVENT, json!(["a", "A?"])).await.unwrap();
        channel.emit(ASK_EVENT, Value::Null).await.unwrap();

        assert_eq!(channel.listener_count(ASK_EVENT), 1);
        assert_eq!(*responses.lock().unwrap(), vec![json!({"a": "yes"})]);
    }

    #[tokio::test]
    async fn test_queue_is_empty_after_response_handler_adds_question() {
        let plugin = fixture(StubRenderer::answering(json!({"city": "Lyon"})));
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        let inner = channel.clone();
        channel.on(RESPONSE_EVENT, move |_| {
            let inner = inner.clone();
            async move { inner.emit(QUESTION_EVENT, json!(["late", "Late?"])).await }
        });
        plugin.add_question("city", "City?", None, None, None);

        channel.emit(ASK_EVENT, Value::Null).await.unwrap();

        assert_eq!(plugin.questions(), Vec::<Question>::new());
    }

    #[tokio::test]
    async fn test_response_handler_failure_keeps_queue() {
        let plugin = fixture(StubRenderer::answering(json!({"city": "Lyon"})));
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        channel.on(RESPONSE_EVENT, |_| async { Err(anyhow::anyhow!("consumer failed")) });
        plugin.add_question("city", "City?", None, None, None);

        let error = channel.emit(ASK_EVENT, Value::Null).await.unwrap_err();

        assert_eq!(error.to_string(), "consumer failed");
        assert_eq!(plugin.questions(), vec![Question::new("city", "City?")]);
    }

    #[tokio::test]
    async fn test_response_handler_may_ask_again() {
        let renderer = StubRenderer::answering(json!({"city": "Lyon"}));
        renderer.push(Ok(to_answers(json!({"late": "yes"}))));
        let plugin = fixture(renderer);
        plugin.init(PluginConfig::default(), Pipe::new()).await.unwrap();
        let channel = prompt_channel(&plugin);
        let responses = capture_responses(&channel);
        let asked_again = Arc::new(AtomicUsize::new(0));
        let inner = channel.clone();
        let counter = asked_again.clone();
        channel.on(RESPONSE_EVENT, move |_| {
            let inner = inner.clone();
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if first {
                    inner.emit(ASK_EVENT, Value::Null).await?;
                }
                Ok(())
            }
        });

        channel.emit(ASK_EVENT, Value::Null).await.unwrap();

        let expected = vec![json!({"city": "Lyon"}), json!({"late": "yes"})];
        assert_eq!(*responses.lock().unwrap(), expected);
    }
}
