//! The `rewrite` verb (§6): parse the isolate, normalize, write it back in
//! canonical pretty-printed form. Unlike `check`/`hashtable`/`run` it never
//! resolves a config-variable binding — it only needs the `NormalizedAst`
//! `load_isolate_as_config` + `flatten`/`invert_map`/`reduce_inputs`/
//! `convert_map_to_conditions` round-trip produces (§8.1's round-trip
//! property is exactly what backs this command).

use crate::cli::RewriteArgs;
use crate::configs::{NormalizedAst, convert_map_to_conditions, invert_map, reduce_inputs};
use crate::error::IsolateError;
use crate::includes::load_with_includes;
use crate::output::{ColorMode, ErrorOutput};
use crate::pretty_print::render_isolate;
use crate::{EXIT_SUCCESS, exit_code_for};

#[must_use]
pub fn run_rewrite(args: &RewriteArgs, color: ColorMode) -> i32 {
    match run_rewrite_impl(args) {
        Ok(code) => code,
        Err(e) => {
            ErrorOutput::new(color).print_error(&e);
            exit_code_for(&e)
        }
    }
}

fn run_rewrite_impl(args: &RewriteArgs) -> crate::Result<i32> {
    let configs = load_with_includes(&args.isolate)?;
    let flat = configs.flatten();
    let inverted = invert_map(&flat);
    let reduced = reduce_inputs(&inverted);
    let clauses = convert_map_to_conditions(&reduced, &configs.axes);
    let ast = NormalizedAst { clauses };

    let rendered = render_isolate(&ast);
    let out_path = args.output.clone().unwrap_or_else(|| args.isolate.clone());
    std::fs::write(&out_path, rendered)
        .map_err(|e| IsolateError::io_with_path(e, out_path.clone()))?;

    println!("wrote {}", out_path.display());
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
