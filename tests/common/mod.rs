#![allow(dead_code)]

pub mod fixtures {
    use futures::future::{ready, FutureExt};
    use resrouter::context::Context;
    use resrouter::demo::MemoryCollection;
    use resrouter::provider::{Provider, RequestHandler, ResourceFuture, Variant};
    use resrouter::request::{Operation, Request};
    use resrouter::response::{ResourceResponse, Response};
    use serde_json::{json, Value};

    /// Handler that answers with what it was asked: its own label, the
    /// residual path it saw, every bound variable of the innermost routing
    /// frame and the depth of the context it received.
    #[derive(Debug, Clone)]
    pub struct Recorder {
        pub label: &'static str,
    }

    impl Recorder {
        pub fn new(label: &'static str) -> Self {
            Self { label }
        }
    }

    impl RequestHandler for Recorder {
        fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
            let variables: serde_json::Map<String, Value> = context
                .routing()
                .map(|frame| {
                    frame
                        .variables()
                        .iter()
                        .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                        .collect()
                })
                .unwrap_or_default();
            let body = json!({
                "label": self.label,
                "path": request.resource_path(),
                "operation": request.operation().as_str(),
                "variables": variables,
                "depth": context.depth(),
            });
            ready(Ok(Response::Resource(ResourceResponse::new(None, None, body)))).boxed()
        }
    }

    /// Singleton declared purely through bindings, answering reads with `content`
    pub fn bound_singleton(name: &str, content: Value) -> Provider {
        Provider::builder(name)
            .variant(Variant::SingletonResource)
            .bind(Operation::Read, move |_call| {
                let body = content.clone();
                ready(Ok(Response::Resource(ResourceResponse::new(None, None, body)))).boxed()
            })
            .build()
    }

    /// `users` collection seeded with two records
    pub fn users() -> MemoryCollection {
        let users = MemoryCollection::new("users");
        users.insert(
            "ada",
            json!({"name": "Ada Lovelace", "email": "ada@example.com", "born": 1815}),
        );
        users.insert(
            "alan",
            json!({"name": "Alan Turing", "email": "alan@example.com", "born": 1912}),
        );
        users
    }

    /// Block on a handler call
    pub fn call<H: RequestHandler + ?Sized>(
        handler: &H,
        request: Request,
    ) -> Result<Response, resrouter::error::ResourceError> {
        futures::executor::block_on(handler.handle(Context::new(), request))
    }

    /// Block on a read and return the resource content
    pub fn read_content<H: RequestHandler + ?Sized>(handler: &H, path: &str) -> Value {
        call(handler, Request::read(path))
            .and_then(Response::into_resource)
            .map(ResourceResponse::into_content)
            .unwrap_or_else(|e| panic!("read {path} failed: {e}"))
    }
}

pub mod tracing_capture {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink installed as the thread-default subscriber for
    /// the lifetime of the value.
    pub struct TestTracing {
        buffer: Arc<Mutex<Vec<u8>>>,
        _guard: tracing::subscriber::DefaultGuard,
    }

    #[derive(Clone)]
    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl TestTracing {
        pub fn init() -> Self {
            let buffer = Arc::new(Mutex::new(Vec::new()));
            let subscriber = tracing_subscriber::fmt()
                .with_writer(BufferWriter(Arc::clone(&buffer)))
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .finish();
            let guard = tracing::subscriber::set_default(subscriber);
            Self {
                buffer,
                _guard: guard,
            }
        }

        /// Everything logged so far
        pub fn output(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.output().contains(needle)
        }
    }
}
