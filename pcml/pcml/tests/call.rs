use std::sync::{Arc, Mutex};

use bytes::Bytes;
use pcml::{
    CallError, ProgramCall,
    core::{
        CallReply, CallRequest, Decimal, FixedHostVersion, HostMessage, Transport,
        TransportError, Usage, Vrm,
    },
    layout::LayoutError,
};

// ── helpers ──────────────────────────────────────────────────────────────────

type Responder = dyn Fn(&CallRequest) -> Result<CallReply, TransportError> + Send + Sync;

/// In-memory host: records every request and answers with `respond`.
struct ScriptedHost {
    requests: Mutex<Vec<CallRequest>>,
    respond: Box<Responder>,
}

impl ScriptedHost {
    fn new(
        respond: impl Fn(&CallRequest) -> Result<CallReply, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    fn replying(outputs: Vec<Option<&'static [u8]>>) -> Self {
        Self::new(move |_| {
            Ok(CallReply {
                success: true,
                outputs: outputs.iter().map(|o| o.map(Bytes::from_static)).collect(),
                ..CallReply::default()
            })
        })
    }

    fn last_request(&self) -> CallRequest {
        self.requests
            .lock()
            .expect("request log")
            .last()
            .cloned()
            .expect("the host was called")
    }
}

impl Transport for ScriptedHost {
    fn invoke(&self, request: &CallRequest) -> Result<CallReply, TransportError> {
        self.requests.lock().expect("request log").push(request.clone());
        (self.respond)(request)
    }
}

fn program_call(markup: &str) -> ProgramCall {
    ProgramCall::builder()
        .with_markup(markup)
        .expect("schema should load")
        .build()
        .expect("call should build")
}

const ECHO: &str = r#"
<pcml version="6.0">
  <struct name="point">
    <data name="x" type="int" length="4" />
    <data name="y" type="int" length="4" />
  </struct>
  <program name="echo" path="/QSYS.LIB/MYLIB.LIB/ECHO.PGM">
    <data name="label" type="char" length="10" usage="inputoutput" />
    <data name="where" type="struct" struct="point" usage="inputoutput" />
    <data name="amount" type="packed" length="9" precision="2" usage="inputoutput" />
  </program>
</pcml>
"#;

const LISTER: &str = r#"
<pcml>
  <program name="ordered" path="/QSYS.LIB/LISTER.PGM" parseorder="listInfo">
    <data name="entries" type="int" length="2" count="listInfo.returned" outputsize="16" usage="output" />
    <data name="entryLen" type="int" length="4" init="16" usage="input" />
    <struct name="listInfo" usage="output">
      <data name="total" type="int" length="4" />
      <data name="returned" type="int" length="4" />
    </struct>
  </program>
  <program name="unordered" path="/QSYS.LIB/LISTER.PGM">
    <data name="entries" type="int" length="2" count="listInfo.returned" outputsize="16" usage="output" />
    <struct name="listInfo" usage="output">
      <data name="total" type="int" length="4" />
      <data name="returned" type="int" length="4" />
    </struct>
  </program>
</pcml>
"#;

const LIST_REPLY: [Option<&[u8]>; 3] = [
    Some(&[0, 7, 0, 8, 0, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
    None,
    Some(&[0, 0, 0, 5, 0, 0, 0, 3]),
];

// ── round trip ───────────────────────────────────────────────────────────────

#[test]
fn serializes_inputs_and_parses_outputs() {
    let mut call = program_call(ECHO);
    call.set_value("echo.label", &[], "hi").unwrap();
    call.set_value("echo.where.x", &[], 1).unwrap();
    call.set_value("echo.where.y", &[], 2).unwrap();
    call.set_value("echo.amount", &[], "12.5").unwrap();

    let host = ScriptedHost::replying(vec![
        Some(&b"ok        "[..]),
        Some(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 7][..]),
        Some(&[0x00, 0x00, 0x00, 0x30, 0x0D][..]),
    ]);
    assert!(call.call("echo", &host).expect("call should run"));

    let request = host.last_request();
    assert_eq!(request.path, "/QSYS.LIB/MYLIB.LIB/ECHO.PGM");
    let inputs: Vec<_> = request
        .parameters
        .iter()
        .map(|p| p.input.as_deref().expect("inputoutput parameters carry input"))
        .collect();
    assert_eq!(inputs[0], &b"hi        "[..]);
    assert_eq!(inputs[1], [0, 0, 0, 1, 0, 0, 0, 2]);
    assert_eq!(inputs[2], [0x00, 0x00, 0x01, 0x25, 0x0C]);
    let sizes: Vec<_> = request.parameters.iter().map(|p| p.output_size).collect();
    assert_eq!(sizes, [10, 8, 5]);

    let doc = call.document_mut();
    assert_eq!(doc.string_value("echo.label", &[]).unwrap(), "ok");
    assert_eq!(doc.int_value("echo.where.x", &[]).unwrap(), -1);
    assert_eq!(doc.int_value("echo.where.y", &[]).unwrap(), 7);
    assert_eq!(
        doc.decimal_value("echo.amount", &[]).unwrap(),
        Decimal::new(-300, 2)
    );
}

#[test]
fn default_ccsid_applies_to_undeclared_char_fields() {
    let mut call = ProgramCall::builder()
        .with_markup(
            r#"<pcml><program name="p" path="/QSYS.LIB/P.PGM">
                 <data name="name" type="char" length="2" usage="input" />
               </program></pcml>"#,
        )
        .expect("schema should load")
        .with_default_ccsid(819)
        .build()
        .expect("call should build");
    call.set_value("p.name", &[], "é").unwrap();

    let host = ScriptedHost::replying(vec![None]);
    call.call("p", &host).unwrap();
    let request = host.last_request();
    assert_eq!(request.parameters[0].usage, Usage::Input);
    assert_eq!(request.parameters[0].input.as_deref(), Some(&[0xE9, 0x20][..]));
    assert_eq!(request.parameters[0].output_size, 0);
}

// ── parse order ──────────────────────────────────────────────────────────────

#[test]
fn parseorder_parameters_are_parsed_first() {
    let mut call = program_call(LISTER);
    let host = ScriptedHost::replying(LIST_REPLY.to_vec());
    assert!(call.call("ordered", &host).unwrap());

    let request = host.last_request();
    let summary: Vec<_> = request
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.usage, p.output_size))
        .collect();
    assert_eq!(
        summary,
        [
            ("entries", Usage::Output, 16),
            ("entryLen", Usage::Input, 0),
            ("listInfo", Usage::Output, 8),
        ]
    );
    assert_eq!(request.parameters[1].input.as_deref(), Some(&[0, 0, 0, 16][..]));

    let doc = call.document_mut();
    assert_eq!(doc.int_value("ordered.listInfo.returned", &[]).unwrap(), 3);
    let entries: Vec<_> = (0..3)
        .map(|i| doc.int_value("ordered.entries", &[i]).unwrap())
        .collect();
    assert_eq!(entries, [7, 8, 9]);
}

#[test]
fn declaration_order_cannot_read_forward_counts() {
    let mut call = program_call(LISTER);
    let host = ScriptedHost::replying(vec![LIST_REPLY[0], LIST_REPLY[2]]);
    let err = call.call("unordered", &host).expect_err("count is parsed after the array");
    assert!(matches!(
        err,
        CallError::Layout(LayoutError::ValueNotSet { ref field, .. }) if field == "unordered.listInfo.returned"
    ));
}

// ── program attributes ───────────────────────────────────────────────────────

#[test]
fn service_program_entry_points_return_values() {
    let mut call = program_call(
        r#"<pcml>
             <program name="calc" path="/QSYS.LIB/MYLIB.LIB/CALC.SRVPGM"
                      entrypoint="ADD_ONE" returnvalue="integer" threadsafe="true">
               <data name="n" type="int" length="4" usage="input" passby="value" />
             </program>
           </pcml>"#,
    );
    call.set_value("calc.n", &[], 41).unwrap();
    let host = ScriptedHost::new(|_| {
        Ok(CallReply {
            success: true,
            outputs: vec![None],
            return_value: Some(42),
            ..CallReply::default()
        })
    });
    assert!(call.call("calc", &host).unwrap());
    assert_eq!(call.return_value(), Some(42));

    let request = host.last_request();
    assert_eq!(request.program, "calc");
    assert_eq!(request.entry_point.as_deref(), Some("ADD_ONE"));
    assert!(request.thread_safe);
}

#[test]
fn host_version_gates_parameters() {
    let markup = r#"<pcml>
        <program name="p" path="/QSYS.LIB/P.PGM">
          <data name="always" type="int" length="4" usage="input" init="1" />
          <data name="newer" type="int" length="4" usage="input" init="2" minvrm="V7R4M0" />
        </program>
      </pcml>"#;
    let mut call = ProgramCall::builder()
        .with_markup(markup)
        .expect("schema should load")
        .with_host_version(Arc::new(FixedHostVersion(Vrm::new(7, 3, 0))))
        .build()
        .expect("call should build");

    let host = ScriptedHost::replying(vec![None]);
    call.call("p", &host).unwrap();
    let names: Vec<_> = host
        .last_request()
        .parameters
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["always"]);
}

// ── failures ─────────────────────────────────────────────────────────────────

#[test]
fn host_failure_keeps_messages_and_skips_parsing() {
    let mut call = program_call(LISTER);
    let host = ScriptedHost::new(|_| {
        Ok(CallReply {
            success: false,
            outputs: vec![None, None, None],
            messages: vec![HostMessage::new("CPF9801", "Object not found.")],
            return_value: None,
        })
    });
    assert!(!call.call("ordered", &host).unwrap());
    assert_eq!(call.messages(), [HostMessage::new("CPF9801", "Object not found.")]);
    assert!(matches!(
        call.value("ordered.listInfo.total", &[]),
        Err(LayoutError::ValueNotSet { .. })
    ));

    let ok = ScriptedHost::replying(LIST_REPLY.to_vec());
    call.call("ordered", &ok).unwrap();
    assert!(call.messages().is_empty());
}

#[test]
fn call_errors_are_reported() {
    let mut call = program_call(LISTER);

    let host = ScriptedHost::replying(vec![]);
    assert!(matches!(
        call.call("missing", &host),
        Err(CallError::UnknownProgram { ref program }) if program == "missing"
    ));
    assert!(matches!(
        call.call("ordered", &host),
        Err(CallError::ReplyShape { expected: 3, actual: 0, .. })
    ));

    let host = ScriptedHost::replying(vec![LIST_REPLY[0], None, None]);
    assert!(matches!(
        call.call("ordered", &host),
        Err(CallError::MissingOutput { ref parameter, .. }) if parameter == "listInfo"
    ));

    let host = ScriptedHost::new(|request| Err(TransportError::new(&request.program, "connection reset")));
    let err = call.call("ordered", &host).expect_err("transport failed");
    assert!(matches!(err, CallError::Transport(ref e) if e.program == "ordered"));
}

#[test]
fn builder_requires_a_schema() {
    assert!(matches!(
        ProgramCall::builder().with_default_codec().build(),
        Err(CallError::MissingSchema)
    ));
}
