use cacti_runtime::prelude::*;

fn run(source: &str) -> Result<Value, Exception> {
    let mut runtime = Runtime::new().expect("runtime failed to bootstrap");
    runtime.execute(source)
}

fn run_ok(source: &str) -> Value {
    match run(source) {
        Ok(value) => value,
        Err(e) => panic!("program failed: {}", e),
    }
}

fn run_err(source: &str) -> Exception {
    match run(source) {
        Ok(value) => panic!("program succeeded with {}", value),
        Err(e) => e,
    }
}

#[test]
fn constants_cannot_be_reassigned() {
    assert_eq!(run_ok("val x = 5; x").as_integer(), Some(5));

    let error = run_err("val x = 5; x = 6");
    assert!(error.is_fatal());
    assert!(matches!(error.root_cause(), Exception::ConstantValue));
    assert_eq!(error.to_string(), "ConstantValueError(Cannot assign to a constant value) at: x = 6");
}

#[test]
fn variables_can_be_reassigned() {
    assert_eq!(run_ok("var x = 5; x = 6; x").as_integer(), Some(6));
    assert_eq!(run_ok("var x = 5; x += 2; x *= 3; x").as_integer(), Some(21));
    assert_eq!(run_ok("var x; x").describe(), "nothing");
}

#[test]
fn subclass_instances_are_their_ancestors() {
    let program = "
        class Foo {}
        class Sub : Foo {}
        class Unrelated {}
        val s = Sub()
    ";

    assert_eq!(run_ok(&format!("{} s.isa(Foo)", program)).as_boolean(), Some(true));
    assert_eq!(run_ok(&format!("{} s.isa(Sub)", program)).as_boolean(), Some(true));
    assert_eq!(run_ok(&format!("{} s.isa(Object)", program)).as_boolean(), Some(true));
    assert_eq!(run_ok(&format!("{} s.isa(Unrelated)", program)).as_boolean(), Some(false));
    assert_eq!(run_ok(&format!("{} s.isa(Integer)", program)).as_boolean(), Some(false));
}

#[test]
fn isa_requires_a_type() {
    let error = run_err("class Foo {}; Foo().isa(5)");
    assert!(matches!(error.root_cause(), Exception::InvalidType(_)));
}

#[test]
fn overrides_reach_the_immediate_ancestor_through_super() {
    let value = run_ok(r#"
        class Foo {
            method greet() { return "A" }
        }
        class Sub : Foo {
            method greet() { return super.greet() + "B" }
        }
        Sub().greet()
    "#);

    assert_eq!(value.as_string().as_deref(), Some("AB"));
}

#[test]
fn super_chains_through_every_level() {
    let value = run_ok(r#"
        class A {
            method greet() { return "A" }
        }
        class B : A {
            method greet() { return super.greet() + "B" }
        }
        class C : B {
            method greet() { return super.greet() + "C" }
        }
        C().greet()
    "#);

    assert_eq!(value.as_string().as_deref(), Some("ABC"));
}

#[test]
fn closures_keep_the_values_they_captured() {
    let mut runtime = Runtime::new().unwrap();

    runtime.execute("var x = 10; var y = 2; val product = closure() { return x * y }").unwrap();
    assert_eq!(runtime.execute("product()").unwrap().as_integer(), Some(20));

    runtime.execute("x = 99").unwrap();
    assert_eq!(runtime.execute("product()").unwrap().as_integer(), Some(20));
}

#[test]
fn closures_created_at_different_moments_are_independent() {
    let mut runtime = Runtime::new().unwrap();

    runtime.execute("var n = 1; val a = closure() { return n }; n = 2; val b = closure() { return n }").unwrap();

    assert_eq!(runtime.execute("a()").unwrap().as_integer(), Some(1));
    assert_eq!(runtime.execute("b()").unwrap().as_integer(), Some(2));
}

#[test]
fn closure_mutations_persist_across_calls() {
    let mut runtime = Runtime::new().unwrap();

    runtime.execute("var count = 0; val next = closure() { count += 1; return count }").unwrap();
    runtime.execute("next()").unwrap();

    assert_eq!(runtime.execute("next()").unwrap().as_integer(), Some(2));
    assert_eq!(runtime.execute("count").unwrap().as_integer(), Some(0));
}

#[test]
fn wrong_argument_count_is_an_arity_error() {
    let mut runtime = Runtime::new().unwrap();
    runtime.execute("var ran = 0; function pair(a, b) { ran = 1; return a }").unwrap();

    let error = runtime.execute("pair(1)").unwrap_err();
    match error.root_cause() {
        Exception::Arity { caller, name, expected, actual } => {
            assert_eq!(caller, "main");
            assert_eq!(name, "pair");
            assert_eq!(*expected, 2);
            assert_eq!(*actual, 1);
        }
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(runtime.execute("ran").unwrap().as_integer(), Some(0));
}

#[test]
fn methods_check_arity_too() {
    let error = run_err("class Foo { method one(a) { return a } }; Foo().one()");
    assert!(matches!(error.root_cause(), Exception::Arity { expected: 1, actual: 0, .. }));
}

#[test]
fn modules_publish_only_exports() {
    let program = "
        module m {
            val a = 1
            val b = 2
            export a
        }
        import m
    ";

    assert_eq!(run_ok(&format!("{} a", program)).as_integer(), Some(1));

    let error = run_err(&format!("{} b", program));
    assert!(matches!(error.root_cause(), Exception::SymbolUnknown(name) if name == "b"));
    assert!(error.root_cause().is_symbol_error());
}

#[test]
fn fatal_errors_are_wrapped_once_at_the_failing_statement() {
    let error = run_err("function f() { val y = 1; y = 2 }; f()");

    match &error {
        Exception::Fatal(fatal) => {
            assert_eq!(fatal.excerpt, "y = 2");
            assert!(!fatal.cause.is_fatal());
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn syntax_errors_are_reported_before_running() {
    let mut runtime = Runtime::new().unwrap();

    assert!(matches!(runtime.execute("val = 1"), Err(Exception::Syntax(_))));
    assert!(!runtime.contains("x"));
}
