use cacti_runtime::prelude::*;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// An output sink that can be read back after the runtime has written to it.
#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(source: &str) -> Result<Value, Exception> {
    Runtime::new().expect("runtime failed to bootstrap").execute(source)
}

fn run_ok(source: &str) -> Value {
    match run(source) {
        Ok(value) => value,
        Err(e) => panic!("program failed: {}", e),
    }
}

fn printed(source: &str) -> String {
    let output = Capture::default();
    let mut runtime = Runtime::with_output(output.clone()).unwrap();

    if let Err(e) = runtime.execute(source) {
        panic!("program failed: {}", e);
    }

    output.text()
}

#[test]
fn fields_are_private_to_their_object() {
    let program = "
        class Account {
            val secret = 42
            method reveal() { return self.secret }
        }
        val account = Account()
    ";

    assert_eq!(run_ok(&format!("{} account.reveal()", program)).as_integer(), Some(42));

    let error = run(&format!("{} account.secret", program)).unwrap_err();
    assert!(error.root_cause().is_symbol_error());
}

#[test]
fn inherited_methods_see_their_own_level_fields() {
    let value = run_ok("
        class Counter {
            var count = 0
            method bump() { self.count += 1; return self.count }
        }
        class Loud : Counter {}
        val counter = Loud()
        counter.bump()
        counter.bump()
    ");

    assert_eq!(value.as_integer(), Some(2));
}

#[test]
fn field_initializers_see_self() {
    let value = run_ok("
        class Pair {
            val left = 3
            val right = self.left * 2
            method sum() { return self.left + self.right }
        }
        Pair().sum()
    ");

    assert_eq!(value.as_integer(), Some(9));
}

#[test]
fn computed_properties() {
    let value = run_ok("
        class Temperature {
            var celsius = 0
            property fahrenheit {
                get { return self.celsius * 9 / 5 + 32 }
                set (value) { self.celsius = (value - 32) * 5 / 9 }
            }
            property kelvin {
                get { return self.celsius + 273 }
            }
        }
        val t = Temperature()
        t.fahrenheit = 212
        t.kelvin
    ");

    assert_eq!(value.as_integer(), Some(373));

    let error = run("class Box { property size { get { return 1 } } }; val b = Box(); b.size = 2").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::ConstantValue));
}

#[test]
fn plain_properties_start_as_nothing() {
    let value = run_ok("
        class Label {
            property text
        }
        val label = Label()
        val before = label.text
        label.text = \"hello\"
        label.text + before
    ");

    assert_eq!(value.as_string().as_deref(), Some("hellonothing"));
}

#[test]
fn operator_overrides() {
    let value = run_ok("
        class Money {
            var cents = 0
            property amount { get { return self.cents } }
            method deposit(n) { self.cents += n; return self }
            operator + (other) { return Money().deposit(self.cents + other.amount) }
            operator [] (i) { return self.cents * i }
        }
        val total = Money().deposit(5) + Money().deposit(7)
        total[10] + total.amount
    ");

    assert_eq!(value.as_integer(), Some(132));
}

#[test]
fn objects_without_an_operator_refuse_it() {
    let error = run("class Foo {}; Foo() + 1").unwrap_err();

    match error.root_cause() {
        Exception::OperationNotSupported { type_name, operation } => {
            assert_eq!(type_name, "Foo");
            assert_eq!(operation, "+");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn classes_are_typed_by_class() {
    let mut runtime = Runtime::new().unwrap();
    runtime.execute("class Foo {}").unwrap();

    assert_eq!(runtime.execute("Foo.isa(Class)").unwrap().as_boolean(), Some(true));
    assert_eq!(runtime.execute("Foo.new().isa(Foo)").unwrap().as_boolean(), Some(true));
    assert_eq!(runtime.execute("Foo.name").unwrap().as_string().as_deref(), Some("Foo"));

    let type_type = runtime.builtin("Type").unwrap();
    assert_eq!(runtime.execute("Type.type").unwrap(), type_type);
    assert_eq!(runtime.execute("Class.type").unwrap(), type_type);
}

#[test]
fn superclass_must_be_a_class() {
    let error = run("val x = 1; class Foo : x {}").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::InvalidType(_)));
}

#[test]
fn number_arithmetic() {
    assert_eq!(run_ok("7 / 2").as_integer(), Some(3));
    assert_eq!(run_ok("1 + 0.5").as_float(), Some(1.5));
    assert_eq!(run_ok("2.5 * 2").as_float(), Some(5.0));
    assert_eq!(run_ok("(1 + 2) * 3 - 4").as_integer(), Some(5));

    let error = run("1 / 0").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::Arithmetic(_)));
}

#[test]
fn functions_see_their_siblings() {
    let value = run_ok("
        function double(n) { return n * 2 }
        function quad(n) { return double(double(n)) }
        quad(3)
    ");

    assert_eq!(value.as_integer(), Some(12));
}

#[test]
fn functions_have_no_self() {
    let error = run("function f() { return self }; f()").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::SymbolUnknown(_)));
}

#[test]
fn anonymous_functions() {
    assert_eq!(run_ok("val add = function(a, b) { return a + b }; add(2, 3)").as_integer(), Some(5));
}

#[test]
fn module_exports_are_read_only_views() {
    let mut runtime = Runtime::new().unwrap();
    runtime.execute("
        module counter {
            var n = 0
            function bump() { n += 1; return n }
            export n, bump
        }
        import counter
    ").unwrap();

    runtime.execute("bump()").unwrap();
    assert_eq!(runtime.execute("n").unwrap().as_integer(), Some(1));

    let error = runtime.execute("n = 5").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::ConstantValue));
}

#[test]
fn module_imports() {
    let program = "
        module geometry.shapes {
            val sides = 4
            val hidden = 0
            export sides
        }
    ";

    assert_eq!(run_ok(&format!("{} import geometry.shapes as shapes; shapes.sides", program)).as_integer(), Some(4));
    assert_eq!(run_ok(&format!("{} import geometry.shapes (sides); sides", program)).as_integer(), Some(4));

    let error = run(&format!("{} import geometry.shapes as shapes; shapes.hidden", program)).unwrap_err();
    assert!(matches!(error.root_cause(), Exception::SymbolUnknown(_)));
}

#[test]
fn module_errors() {
    let error = run("module m {}; module m {}").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::Symbol(_)));

    let error = run("module m { export missing }").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::SymbolUnknown(_)));

    let error = run("import nowhere").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::SymbolUnknown(_)));

    let error = run("val a = 1; export a; a").unwrap_err();
    assert!(matches!(error.root_cause(), Exception::Symbol(_)));

    let error = run("export nope; 1").unwrap_err();
    assert!(error.root_cause().is_symbol_error());
}

#[test]
fn print_writes_the_string_property() {
    let output = printed(r#"
        class Foo {}
        class Named {
            property string { get { return "custom" } }
        }
        print(3)
        print(1.5)
        print("hi")
        print(true)
        print(nothing)
        print(Foo)
        print(Foo())
        print(Named())
    "#);

    assert_eq!(output, "3\n1.5\nhi\ntrue\nnothing\n<Class 'Foo'>\n<Foo>\ncustom\n");
}

#[test]
fn print_reads_the_string_member_through_the_dot_hook() {
    let output = printed(r#"
        class Shouty {
            operator . (name) { return "loud" }
        }
        val s = Shouty()
        print(s)
        print(s.string)
    "#);

    assert_eq!(output, "loud\nloud\n");
}
