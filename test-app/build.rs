//! Generates the builders requested in `src/`.

fn main() -> buildergen_codegen::Result<()> {
    let _log = buildergen_codegen::init_tracing();
    let report = buildergen_codegen::generate()?;
    for diagnostic in report.diagnostics.iter().filter(|diagnostic| !diagnostic.is_error()) {
        println!("cargo:warning=note: {diagnostic}");
    }
    Ok(())
}
