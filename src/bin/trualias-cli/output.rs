use anyhow::Result;
use trualias::{DiagnosticList, Resolved};

pub fn print_diagnostics(diags: &DiagnosticList, json: bool) -> Result<()> {
    if json {
        #[cfg(feature = "with-serde")]
        {
            let rendered: Vec<_> = diags
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "severity": d.severity.to_string(),
                        "line": d.line,
                        "column": d.column,
                        "message": d.kind.to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
            return Ok(());
        }
        #[cfg(not(feature = "with-serde"))]
        {
            eprintln!("--json requires the 'with-serde' feature; falling back to text");
        }
    }
    eprintln!("{}", trualias::diagnostics::render(diags));
    Ok(())
}

pub fn print_resolved(resolved: &Resolved) -> Result<()> {
    match resolved {
        Resolved::Match { account, reply } => println!("MATCH {account} {reply}"),
        Resolved::Debug { reply } => println!("DEBUG {reply}"),
        Resolved::NotFound => println!("NOTFOUND"),
    }
    Ok(())
}
