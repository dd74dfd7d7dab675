use anyhow::Result;
use indoc::indoc;

use vanction::backend::{Backend, backends};
use vanction::interpreter::Interpreter;
use vanction::parser::parse;
use vanction::transpiler::Transpiler;

#[test]
fn plus_concatenates_in_the_interpreter_but_adds_in_cpp() -> Result<()> {
    let program = parse(indoc! {"
        func main() {
            auto x = 1 + 2 * 3;
            System.print(x);
        }
    "})?;

    assert_eq!(Interpreter::new().run(&program, "")?, "16\n");
    let generated = Transpiler::new().generate(&program);
    assert!(generated.contains("auto x = 1 + 2 * 3;"));
    assert!(generated.contains("std::cout << x << std::endl;"));
    Ok(())
}

#[test]
fn printed_concatenation_streams_each_operand() -> Result<()> {
    let program = parse(indoc! {r#"
        func main() {
            int n = 4;
            System.print("n=" + n + "!");
        }
    "#})?;

    assert_eq!(Interpreter::new().run(&program, "")?, "n=4!\n");
    assert!(
        Transpiler::new()
            .generate(&program)
            .contains(r#"std::cout << "n=" << n << "!" << std::endl;"#)
    );
    Ok(())
}

#[test]
fn unmatched_switch_fails_in_both_backends() -> Result<()> {
    let program = parse("func main() { switch (3) { case 1 { } } }")?;

    let error = Interpreter::new()
        .run(&program, "")
        .expect_err("interpreter should reject an unmatched switch");
    assert_eq!(error.to_string(), "No case matches switch value 3");
    assert!(
        Transpiler::new()
            .generate(&program)
            .contains(r#"throw vn_error("ValueError", "No case matches switch value " + vn_to_string(vn_switch_0));"#)
    );
    Ok(())
}

#[test]
fn integer_to_boolean_equality_diverges_between_backends() -> Result<()> {
    let program = parse(indoc! {"
        func main() {
            System.print(1 == true);
        }
    "})?;

    // Values of different kinds never compare equal in the interpreter; C++
    // promotes `true` to 1.
    assert_eq!(Interpreter::new().run(&program, "")?, "false\n");
    assert!(
        Transpiler::new()
            .generate(&program)
            .contains("std::cout << (1 == true) << std::endl;")
    );
    Ok(())
}

#[test]
fn caught_error_messages_match_across_backends() -> Result<()> {
    let program = parse(indoc! {r#"
        func main() {
            try { n = type:int("4x"); } happen (ValueError) as e { System.print(e); }
        }
    "#})?;

    assert_eq!(
        Interpreter::new().run(&program, "")?,
        "Cannot convert 4x to int\n"
    );
    let generated = Transpiler::new().generate(&program);
    assert!(generated.contains(r#"vn_error("ValueError", "Cannot convert " + value + " to int")"#));
    assert!(generated.contains(r#"if (!vn_error_is(vn_caught_0, "ValueError")) {"#));
    Ok(())
}

#[test]
fn registry_lists_both_backends() {
    let names: Vec<&str> = backends().iter().map(|backend| backend.name()).collect();
    assert_eq!(names, vec!["interpreter", "transpiler"]);
}
