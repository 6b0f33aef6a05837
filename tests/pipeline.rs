/// Middleware pipeline tests
///
/// Order of pre/post phases, short-circuiting, argument mutation and
/// error recovery across the onion.

use async_trait::async_trait;
use ferrous_invoke::{build_pipeline, Handler, Middleware, Next, Pipeline};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Arg {
    event: String,
    order: Vec<String>,
}

struct Marker(&'static str);

#[async_trait]
impl Middleware<Arg, String> for Marker {
    async fn handle(&self, arg: &mut Arg, next: Next<Arg, String>) -> String {
        arg.order.push(format!("{}-pre", self.0));
        let result = next.run(arg).await;
        arg.order.push(format!("{}-post", self.0));
        result
    }
}

fn marker_pipeline(names: &[&'static str]) -> Pipeline<Arg, String> {
    let mut pipeline = Pipeline::new();
    for &name in names {
        pipeline.use_middleware(Marker(name));
    }
    pipeline
}

#[tokio::test]
async fn test_onion_order() {
    let compiled = marker_pipeline(&["m1", "m2"]).handler_fn(|arg| {
        Box::pin(async move {
            arg.order.push("h".to_string());
            "result".to_string()
        })
    });

    let mut arg = Arg::default();
    assert_eq!(compiled.invoke(&mut arg).await, "result");
    assert_eq!(arg.order, ["m1-pre", "m2-pre", "h", "m2-post", "m1-post"]);
}

#[tokio::test]
async fn test_order_holds_when_steps_suspend() {
    let mut pipeline = Pipeline::<Arg, String>::new();
    pipeline.use_fn(|arg, next| {
        Box::pin(async move {
            arg.order.push("slow-pre".to_string());
            tokio::time::sleep(Duration::from_millis(5)).await;
            let result = next.run(arg).await;
            tokio::task::yield_now().await;
            arg.order.push("slow-post".to_string());
            result
        })
    });
    pipeline.use_middleware(Marker("fast"));

    let compiled = pipeline.handler_fn(|arg| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            arg.order.push("h".to_string());
            String::new()
        })
    });

    let mut arg = Arg::default();
    compiled.invoke(&mut arg).await;
    assert_eq!(arg.order, ["slow-pre", "fast-pre", "h", "fast-post", "slow-post"]);
}

#[tokio::test]
async fn test_short_circuit_skips_rest() {
    let mut pipeline = Pipeline::<Arg, String>::new();
    pipeline.use_fn(|arg, _next| {
        Box::pin(async move {
            arg.order.push("m1-pre".to_string());
            "cached".to_string()
        })
    });
    pipeline.use_middleware(Marker("m2"));

    let compiled = pipeline.handler_fn(|arg| {
        Box::pin(async move {
            arg.order.push("h".to_string());
            "result".to_string()
        })
    });

    let mut arg = Arg::default();
    assert_eq!(compiled.invoke(&mut arg).await, "cached");
    assert_eq!(arg.order, ["m1-pre"]);
}

#[tokio::test]
async fn test_mutation_visible_downstream() {
    let mut pipeline = Pipeline::<Arg, String>::new();
    pipeline.use_fn(|arg, next| {
        Box::pin(async move {
            arg.event = "X".to_string();
            next.run(arg).await
        })
    });
    pipeline.use_fn(|arg, next| {
        Box::pin(async move {
            let seen = arg.event.clone();
            arg.order.push(format!("m2 saw {}", seen));
            next.run(arg).await
        })
    });

    let compiled = pipeline.handler_fn(|arg| Box::pin(async move { arg.event.clone() }));

    let mut arg = Arg {
        event: "original".to_string(),
        ..Arg::default()
    };
    assert_eq!(compiled.invoke(&mut arg).await, "X");
    assert_eq!(arg.order, ["m2 saw X"]);
}

#[tokio::test]
async fn test_result_transformed_on_the_way_out() {
    let mut pipeline = marker_pipeline(&["m1"]);
    pipeline.use_fn(|arg, next| Box::pin(async move { next.run(arg).await.to_uppercase() }));

    let compiled = pipeline.handler_fn(|_| Box::pin(async { "result".to_string() }));
    let mut arg = Arg::default();
    assert_eq!(compiled.invoke(&mut arg).await, "RESULT");
}

#[tokio::test]
async fn test_zero_middleware_matches_handler() {
    let handler = |arg: &mut Arg| {
        arg.order.push("h".to_string());
        format!("handled {}", arg.event)
    };

    let compiled = Pipeline::<Arg, String>::new()
        .handler_fn(move |arg| Box::pin(async move { handler(arg) }));
    assert_eq!(compiled.middleware_count(), 0);

    let mut through_pipeline = Arg {
        event: "e".to_string(),
        ..Arg::default()
    };
    let mut direct = Arg {
        event: "e".to_string(),
        ..Arg::default()
    };
    assert_eq!(compiled.invoke(&mut through_pipeline).await, handler(&mut direct));
    assert_eq!(through_pipeline.order, direct.order);
}

#[derive(Debug, PartialEq)]
struct HandlerError(&'static str);

type Outcome = Result<String, HandlerError>;

struct Failing;

#[async_trait]
impl Handler<Arg, Outcome> for Failing {
    async fn call(&self, _arg: &mut Arg) -> Outcome {
        Err(HandlerError("db down"))
    }
}

struct Recover;

#[async_trait]
impl Middleware<Arg, Outcome> for Recover {
    async fn handle(&self, arg: &mut Arg, next: Next<Arg, Outcome>) -> Outcome {
        match next.run(arg).await {
            Ok(value) => Ok(value),
            Err(HandlerError(reason)) => {
                arg.order.push(format!("recovered {}", reason));
                Ok("fallback".to_string())
            }
        }
    }
}

struct Observe;

#[async_trait]
impl Middleware<Arg, Outcome> for Observe {
    async fn handle(&self, arg: &mut Arg, next: Next<Arg, Outcome>) -> Outcome {
        let result = next.run(arg).await;
        if result.is_err() {
            arg.order.push("observed failure".to_string());
        }
        result
    }
}

#[tokio::test]
async fn test_errors_propagate_unchanged_until_caught() {
    let observe: Arc<dyn Middleware<Arg, Outcome>> = Arc::new(Observe);
    let recover: Arc<dyn Middleware<Arg, Outcome>> = Arc::new(Recover);

    let uncaught = build_pipeline(vec![observe.clone()], Failing);
    let mut arg = Arg::default();
    assert_eq!(uncaught.invoke(&mut arg).await, Err(HandlerError("db down")));
    assert_eq!(arg.order, ["observed failure"]);

    let recovered = build_pipeline(vec![recover, observe], Failing);
    let mut arg = Arg::default();
    assert_eq!(recovered.invoke(&mut arg).await, Ok("fallback".to_string()));
    assert_eq!(arg.order, ["observed failure", "recovered db down"]);
}

#[tokio::test]
async fn test_each_invocation_starts_fresh() {
    let compiled = marker_pipeline(&["m"]).handler_fn(|arg| Box::pin(async move { arg.order.len().to_string() }));

    let mut first = Arg::default();
    let mut second = Arg::default();
    assert_eq!(compiled.invoke(&mut first).await, "1");
    assert_eq!(compiled.invoke(&mut second).await, "1");
    assert_eq!(first.order, second.order);
}

// Property: for any list of middleware the recorded order is every pre phase
// in declaration order, the handler, then every post phase reversed.
proptest! {
    #[test]
    fn onion_order_is_lifo(count in 0usize..12) {
        const NAMES: [&str; 12] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
        let names = &NAMES[..count];

        let compiled = marker_pipeline(names).handler_fn(|arg| {
            Box::pin(async move {
                arg.order.push("h".to_string());
                String::new()
            })
        });

        let mut arg = Arg::default();
        futures::executor::block_on(compiled.invoke(&mut arg));

        let mut expected: Vec<String> = names.iter().map(|n| format!("{}-pre", n)).collect();
        expected.push("h".to_string());
        expected.extend(names.iter().rev().map(|n| format!("{}-post", n)));
        prop_assert_eq!(arg.order, expected);
    }
}
