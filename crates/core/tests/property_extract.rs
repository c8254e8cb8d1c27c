use paperfind_core::extract;
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct ArgSpec {
    name: String,
    value: String,
    quote: Option<char>,
}

fn arg_spec() -> impl Strategy<Value = ArgSpec> {
    let text = (
        "[a-z_][a-z0-9_]{0,8}",
        "[A-Za-z0-9 .,]{0,16}",
        prop_oneof![Just('\''), Just('"')],
    )
        .prop_map(|(name, value, quote)| ArgSpec {
            name,
            value,
            quote: Some(quote),
        });
    let numeral = ("[a-z_][a-z0-9_]{0,8}", any::<u32>()).prop_map(|(name, value)| ArgSpec {
        name,
        value: value.to_string(),
        quote: None,
    });
    prop_oneof![text, numeral]
}

fn arg_vec() -> impl Strategy<Value = Vec<ArgSpec>> {
    prop::collection::vec(arg_spec(), 0..6)
}

fn whitespace() -> impl Strategy<Value = String> {
    "[ \t]{0,2}".prop_map(|ws| ws)
}

fn commentary() -> impl Strategy<Value = (String, String)> {
    let lead = prop_oneof![
        Just(String::new()),
        Just("Sure! ".to_string()),
        Just("Here is the tool call:\n".to_string()),
        Just("Here is my result (as requested): ".to_string()),
        Just("Okay. ".to_string()),
    ];
    let trail = prop_oneof![
        Just(String::new()),
        Just("\nDone.".to_string()),
        Just(" Let me know if you need anything else.".to_string()),
    ];
    (lead, trail)
}

fn render(args: &[ArgSpec], ws: &str, lead: &str, trail: &str) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| match arg.quote {
            Some(quote) => format!("{}{ws}={ws}{quote}{}{quote}", arg.name, arg.value),
            None => format!("{}{ws}={ws}{}", arg.name, arg.value),
        })
        .collect();
    format!(
        "{lead}paper_search_tool{ws}({}{ws}){trail}",
        rendered.join(&format!(",{ws}"))
    )
}

proptest! {
    // Any well-formed call text built from the grammar extracts back to the
    // same semantic argument set, whatever the quote style and spacing.
    #[test]
    fn extraction_round_trips((args, ws, (lead, trail)) in (arg_vec(), whitespace(), commentary())) {
        let raw = render(&args, &ws, &lead, &trail);
        let request = extract(&raw)
            .expect("well-formed call must not be malformed")
            .expect("call must be recognized");
        prop_assert_eq!(request.tool_name, "paper_search_tool");
        prop_assert_eq!(request.arguments.len(), args.len());
        for (extracted, spec) in request.arguments.iter().zip(&args) {
            prop_assert_eq!(&extracted.0, &spec.name);
            prop_assert_eq!(&extracted.1, &spec.value);
        }
    }

    #[test]
    fn foreign_identifiers_never_extract(name in "[a-z_][a-z0-9_]{0,12}") {
        prop_assume!(name != "paper_search_tool");
        let raw = format!("{name}(comparator='in', year=2019)");
        prop_assert!(extract(&raw).unwrap().is_none());
    }
}
