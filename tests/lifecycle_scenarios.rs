use meshestra_context::prelude::*;
use meshestra_context::context::MESSAGE_SOURCE;
use meshestra_context::live;
use meshestra_context::registry::RegistryPostProcessor;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use strum::IntoEnumIterator;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log) -> Arc<dyn ApplicationListener> {
    let log = Arc::clone(log);
    listener::on_event(move |event| {
        log.lock().push(event.event_type().to_string());
        Ok(())
    })
}

#[derive(Debug)]
struct OrderPlaced {
    id: u32,
}

struct PhaseRecorder {
    phases: Arc<Mutex<Vec<RefreshPhase>>>,
}

impl RefreshHooks for PhaseRecorder {
    fn before_phase(&self, _context: &ApplicationContext, phase: RefreshPhase) {
        self.phases.lock().push(phase);
    }
}

#[test]
fn refresh_runs_phases_in_fixed_order() {
    init_tracing();
    let phases: Arc<Mutex<Vec<RefreshPhase>>> = Arc::default();
    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .hooks(PhaseRecorder {
            phases: Arc::clone(&phases),
        })
        .build();

    context.refresh().unwrap();

    let expected: Vec<RefreshPhase> = RefreshPhase::iter().collect();
    assert_eq!(*phases.lock(), expected);
}

#[test]
fn guarded_access_before_refresh_and_after_close() {
    init_tracing();
    let log: Log = Arc::default();
    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .listener(recorder(&log))
        .build();

    let err = context.get_component("environment").unwrap_err();
    assert!(err.is_illegal_state());
    assert!(err.to_string().contains("has not been refreshed yet"));

    context.refresh().unwrap();
    assert!(context.is_active());
    assert!(context.get_component("environment").is_ok());

    context.close();
    assert!(!context.is_active());
    context.close();

    let err = context.get_component("environment").unwrap_err();
    assert!(err.to_string().contains("has been closed already"));

    let closed = log
        .lock()
        .iter()
        .filter(|e| e.as_str() == "ContextClosed")
        .count();
    assert_eq!(closed, 1);
}

#[test]
fn child_events_bubble_to_every_ancestor_once() {
    init_tracing();
    let root_orders: Arc<Mutex<Vec<u32>>> = Arc::default();
    let child_orders: Arc<Mutex<Vec<u32>>> = Arc::default();

    let sink = Arc::clone(&root_orders);
    let root = ApplicationContext::builder()
        .display_name("root")
        .environment(Environment::empty())
        .listener(listener::on_payload::<OrderPlaced, _>(move |_, order| {
            sink.lock().push(order.id);
            Ok(())
        }))
        .build();
    let middle = ApplicationContext::builder()
        .display_name("middle")
        .environment(Environment::empty())
        .parent(&root)
        .build();
    let sink = Arc::clone(&child_orders);
    let leaf = ApplicationContext::builder()
        .display_name("leaf")
        .environment(Environment::empty())
        .parent(&middle)
        .listener(listener::on_payload::<OrderPlaced, _>(move |_, order| {
            sink.lock().push(order.id);
            Ok(())
        }))
        .build();

    root.refresh().unwrap();
    middle.refresh().unwrap();
    leaf.refresh().unwrap();

    leaf.publish(OrderPlaced { id: 7 }).unwrap();
    root.publish(OrderPlaced { id: 8 }).unwrap();

    assert_eq!(*root_orders.lock(), vec![7, 8]);
    // Events never travel down the hierarchy
    assert_eq!(*child_orders.lock(), vec![7]);
}

struct TickingHooks {
    log: Log,
    seen_during_on_refresh: Arc<Mutex<Option<usize>>>,
}

impl RefreshHooks for TickingHooks {
    fn on_refresh(&self, context: &ApplicationContext) -> meshestra_context::Result<()> {
        for tick in 0..3u32 {
            context.publish(tick)?;
        }
        *self.seen_during_on_refresh.lock() = Some(self.log.lock().len());
        Ok(())
    }
}

#[test]
fn early_events_delivered_once_in_order_after_dispatcher_is_ready() {
    init_tracing();
    let log: Log = Arc::default();
    let ticks: Arc<Mutex<Vec<u32>>> = Arc::default();
    let seen_during_on_refresh: Arc<Mutex<Option<usize>>> = Arc::default();

    let sink = Arc::clone(&ticks);
    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .hooks(TickingHooks {
            log: Arc::clone(&log),
            seen_during_on_refresh: Arc::clone(&seen_during_on_refresh),
        })
        .listener(recorder(&log))
        .listener(listener::on_payload::<u32, _>(move |_, tick| {
            sink.lock().push(*tick);
            Ok(())
        }))
        .build();

    context.refresh().unwrap();

    assert_eq!(*seen_during_on_refresh.lock(), Some(0));
    assert_eq!(*ticks.lock(), vec![0, 1, 2]);
    assert_eq!(
        *log.lock(),
        vec![
            "PayloadEvent<u32>",
            "PayloadEvent<u32>",
            "PayloadEvent<u32>",
            "ContextRefreshed"
        ]
    );
}

struct Connection {
    log: Log,
}

impl Disposable for Connection {
    fn destroy(&self) -> anyhow::Result<()> {
        self.log.lock().push("connection destroyed".to_string());
        Ok(())
    }
}

struct SabotagingProcessor {
    log: Log,
}

impl RegistryPostProcessor for SabotagingProcessor {
    fn post_process_registry(&self, registry: &dyn Registry) -> anyhow::Result<()> {
        let log = Arc::clone(&self.log);
        registry.register_definition(
            "connection",
            ComponentDefinition::singleton(move |_| {
                let connection = Arc::new(Connection {
                    log: Arc::clone(&log),
                });
                Ok(Component::from_arc(Arc::clone(&connection)).with_disposable(connection))
            }),
        )?;
        // Created while registry post-processors run
        registry.find_by_name("connection")?;

        registry.register_definition(
            "broken_processor",
            ComponentDefinition::singleton(|_| anyhow::bail!("cannot build processor"))
                .provides(ComponentKind::InstancePostProcessor),
        )?;
        Ok(())
    }
}

#[test]
fn failed_refresh_destroys_created_singletons_and_stays_inactive() {
    init_tracing();
    let log: Log = Arc::default();
    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .listener(recorder(&log))
        .registry_post_processor(Arc::new(SabotagingProcessor {
            log: Arc::clone(&log),
        }))
        .build();

    let err = context.refresh().unwrap_err();
    assert!(err.is_initialization());
    assert!(err.to_string().contains("broken_processor"));

    assert_eq!(*log.lock(), vec!["connection destroyed"]);
    assert!(!context.is_active());
    assert!(!context.is_closed());

    context.close();
    assert!(!context.is_closed());
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn messages_fall_back_to_parent_context() {
    init_tracing();
    let parent_registry = MemoryRegistry::builder()
        .singleton(MESSAGE_SOURCE, |_| {
            let source = Arc::new(StaticMessageSource::new());
            source.add_message("greeting", &Locale::new("en"), "Hello, {0}");
            source.add_message("greeting", &Locale::new("de"), "Hallo, {0}");
            Ok(Component::from_arc(Arc::clone(&source)).with_message_source(source))
        })
        .build();
    let parent = ApplicationContext::builder()
        .environment(Environment::empty())
        .registry(parent_registry)
        .build();

    let child_registry = MemoryRegistry::builder()
        .singleton(MESSAGE_SOURCE, |_| {
            let source = Arc::new(StaticMessageSource::new());
            source.add_message("farewell", &Locale::root(), "Bye");
            Ok(Component::from_arc(Arc::clone(&source)).with_message_source(source))
        })
        .build();
    let child = ApplicationContext::builder()
        .environment(Environment::empty())
        .parent(&parent)
        .registry(child_registry)
        .build();

    parent.refresh().unwrap();
    child.refresh().unwrap();

    let de_at = Locale::parse("de_AT");
    assert_eq!(child.get_message("greeting", &[&"Ana"], &de_at).unwrap(), "Hallo, Ana");
    assert_eq!(child.get_message("farewell", &[], &de_at).unwrap(), "Bye");
    assert_eq!(
        child
            .get_message_or_default("unknown", &[], "fallback", &de_at)
            .unwrap(),
        "fallback"
    );

    let err = child.get_message("unknown", &[], &de_at).unwrap_err();
    assert!(matches!(err, ContextError::NoSuchMessage { .. }));

    let resolvable = MessageResolvable::new(["title.order", "greeting"]).with_args(["Bo"]);
    assert_eq!(
        child
            .get_message_resolvable(&resolvable, &Locale::new("en"))
            .unwrap(),
        "Hello, Bo"
    );
}

#[test]
fn messages_resolve_through_parent_without_declared_sources() {
    init_tracing();
    let parent = ApplicationContext::builder()
        .environment(Environment::empty())
        .build();
    let child = ApplicationContext::builder()
        .environment(Environment::empty())
        .parent(&parent)
        .build();
    parent.refresh().unwrap();
    child.refresh().unwrap();

    assert_eq!(
        child
            .get_message_or_default("anything", &[&3], "{0} items", &Locale::root())
            .unwrap(),
        "3 items"
    );
    assert!(child.get_message("anything", &[], &Locale::root()).is_err());
}

#[test]
fn live_view_tracks_refreshed_contexts() {
    init_tracing();
    let context = ApplicationContext::builder()
        .id("live-view-scenario")
        .display_name("live view")
        .environment(Environment::empty())
        .build();
    assert!(!live::is_live("live-view-scenario"));

    context.refresh().unwrap();
    assert!(live::is_live("live-view-scenario"));
    let json = live::snapshot_json().unwrap();
    assert!(json.contains("\"displayName\": \"live view\""));

    context.close();
    assert!(!live::is_live("live-view-scenario"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_hook_closes_context_once() {
    init_tracing();
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel::<()>();
    let closed_tx = Mutex::new(Some(closed_tx));

    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .listener(listener::on_context(ContextEvent::Closed, move |_| {
            if let Some(tx) = closed_tx.lock().take() {
                let _ = tx.send(());
            }
            Ok(())
        }))
        .build();
    context.refresh().unwrap();

    let (trigger_tx, trigger_rx) = tokio::sync::oneshot::channel::<()>();
    context
        .register_shutdown_hook_on(async move {
            let _ = trigger_rx.await;
        })
        .unwrap();
    // Second registration is a no-op
    context.register_shutdown_hook_on(std::future::pending()).unwrap();
    assert!(context.has_shutdown_hook());

    trigger_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), closed_rx)
        .await
        .expect("context was not closed by the shutdown hook")
        .unwrap();

    assert!(context.is_closed());
    context.close();
    assert!(!context.has_shutdown_hook());
}

struct QueueConsumer {
    running: Arc<AtomicBool>,
}

impl Lifecycle for QueueConsumer {
    fn start(&self) -> anyhow::Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[test]
fn failed_refresh_after_startup_stops_lifecycle_components() {
    init_tracing();
    let consumer_running = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&consumer_running);
    let registry = MemoryRegistry::builder()
        .singleton("consumer", move |_| {
            let consumer = Arc::new(QueueConsumer {
                running: Arc::clone(&flag),
            });
            Ok(Component::from_arc(Arc::clone(&consumer)).with_lifecycle(consumer))
        })
        .build();

    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .registry(registry)
        .listener(listener::on_context(ContextEvent::Refreshed, |_| {
            anyhow::bail!("readiness check rejected")
        }))
        .build();

    let err = context.refresh().unwrap_err();
    assert!(err.to_string().contains("ContextRefreshed"));

    assert!(!context.is_active());
    assert!(!context.is_running());
    assert!(!consumer_running.load(Ordering::SeqCst));
    assert!(matches!(
        context.event_dispatcher(),
        Err(ContextError::IllegalState(_))
    ));
    assert!(context.lifecycle_coordinator().is_err());
    assert!(context.message_source().is_err());
    assert!(context.publish(OrderPlaced { id: 1 }).unwrap_err().is_illegal_state());
}

struct BlockingHooks {
    entered: Arc<Barrier>,
    closed_during_on_refresh: Arc<AtomicBool>,
}

impl RefreshHooks for BlockingHooks {
    fn on_refresh(&self, context: &ApplicationContext) -> meshestra_context::Result<()> {
        self.entered.wait();
        // Leave the closing thread time to reach the lifecycle lock
        thread::sleep(Duration::from_millis(100));
        self.closed_during_on_refresh
            .store(context.is_closed(), Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn close_waits_for_refresh_in_progress() {
    init_tracing();
    let log: Log = Arc::default();
    let entered = Arc::new(Barrier::new(2));
    let closed_during_on_refresh = Arc::new(AtomicBool::new(false));

    let context = ApplicationContext::builder()
        .environment(Environment::empty())
        .hooks(BlockingHooks {
            entered: Arc::clone(&entered),
            closed_during_on_refresh: Arc::clone(&closed_during_on_refresh),
        })
        .listener(recorder(&log))
        .build();

    let refreshing = {
        let context = Arc::clone(&context);
        thread::spawn(move || context.refresh())
    };
    entered.wait();
    let closing = {
        let context = Arc::clone(&context);
        thread::spawn(move || context.close())
    };

    refreshing.join().unwrap().unwrap();
    closing.join().unwrap();

    assert!(!closed_during_on_refresh.load(Ordering::SeqCst));
    assert_eq!(*log.lock(), vec!["ContextRefreshed", "ContextClosed"]);
    assert!(context.is_closed());
    assert!(!context.is_active());
}
