//! `cachexp expand` -- expand a JSON document against a directory cache.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use cachexp_core::{expand, ExpandError, ExpandErrors, Provider};
use cachexp_storage::{CacheProvider, DirStore, HttpOrigin, OriginConfig, RequestContext};

use crate::settings::{load_settings, Settings};
use crate::{report_error, OutputFormat};

/// Flags of the expand subcommand; `None` means "keep the file value".
pub(crate) struct ExpandOptions<'a> {
    pub input: &'a Path,
    pub settings: Option<&'a Path>,
    pub store: Option<PathBuf>,
    pub depth: Option<u32>,
    pub expand_key: Option<String>,
    pub placeholder_key: Option<String>,
    pub exclude: Vec<String>,
    pub origin: Option<String>,
    pub headers: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub strict: bool,
    pub pretty: bool,
    pub output: OutputFormat,
    pub quiet: bool,
}

fn die(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

pub(crate) fn cmd_expand(opts: ExpandOptions<'_>) {
    let (output, quiet) = (opts.output, opts.quiet);

    let settings = match load_settings(opts.settings) {
        Ok(s) => apply_overrides(s, &opts),
        Err(e) => die(&format!("error: {}", e), output, quiet),
    };
    if let Err(e) = settings.expand.validate() {
        die(&format!("error: invalid configuration: {}", e), output, quiet);
    }

    let dir = match settings.store.dir.clone() {
        Some(dir) => dir,
        None => die("error: no cache directory; pass --store or set [store] dir", output, quiet),
    };

    let ctx = match build_context(&opts.headers, opts.timeout_ms) {
        Ok(ctx) => ctx,
        Err(e) => die(&format!("error: {}", e), output, quiet),
    };

    let input = match read_input(opts.input) {
        Ok(bytes) => bytes,
        Err(e) => die(&format!("error: {}", e), output, quiet),
    };

    tracing::info!(
        store = %dir.display(),
        depth = settings.expand.max_depth,
        origin = settings.origin.as_ref().map(|o| o.base_url.as_str()),
        "expanding document"
    );

    let provider = CacheProvider::new(DirStore::new(dir), settings.expand.clone())
        .with_normalizer(settings.store.normalizer())
        .write_through(settings.store.write_through);

    let result = match &settings.origin {
        Some(origin) => run(
            &provider.with_origin(HttpOrigin::from_config(origin)),
            &input,
            &ctx,
        ),
        None => run(&provider, &input, &ctx),
    };

    let (bytes, errors) = match result {
        Ok(out) => out,
        Err(e) => die(&format!("error: {}", e), output, quiet),
    };

    if !errors.is_empty() {
        report_expand_errors(&errors, output, quiet);
        if opts.strict {
            process::exit(1);
        }
    }

    match render(&bytes, opts.pretty) {
        Ok(text) => println!("{}", text),
        Err(e) => die(&format!("error: {}", e), output, quiet),
    }
}

fn run<P>(
    provider: &P,
    input: &[u8],
    ctx: &RequestContext,
) -> Result<(Vec<u8>, ExpandErrors), ExpandError>
where
    P: Provider<Context = RequestContext>,
{
    let out = expand(provider, input, ctx)?;
    Ok((out.bytes, out.errors))
}

fn apply_overrides(mut settings: Settings, opts: &ExpandOptions<'_>) -> Settings {
    if let Some(dir) = &opts.store {
        settings.store.dir = Some(dir.clone());
    }
    if let Some(depth) = opts.depth {
        settings.expand.max_depth = depth;
    }
    if let Some(key) = &opts.expand_key {
        settings.expand.expand_key = key.clone();
    }
    if let Some(key) = &opts.placeholder_key {
        settings.expand.placeholder_key = key.clone();
    }
    settings.expand.exclude.extend(opts.exclude.iter().cloned());

    match (&opts.origin, settings.origin.as_mut()) {
        (Some(url), Some(origin)) => origin.base_url = url.clone(),
        (Some(url), None) => {
            settings.origin = Some(OriginConfig {
                base_url: url.clone(),
                timeout_ms: None,
            })
        }
        (None, _) => {}
    }
    if let (Some(ms), Some(origin)) = (opts.timeout_ms, settings.origin.as_mut()) {
        origin.timeout_ms = Some(ms);
    }
    settings
}

/// Parse `Name: value` header flags into a request context.
fn build_context(headers: &[String], timeout_ms: Option<u64>) -> Result<RequestContext, String> {
    let mut ctx = RequestContext::new();
    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("invalid header '{}', expected 'Name: value'", raw))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("invalid header '{}', empty name", raw));
        }
        ctx = ctx.with_header(name, value.trim());
    }
    if let Some(ms) = timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(ms));
    }
    Ok(ctx)
}

/// Read the document from a file, or from stdin when the path is `-`.
fn read_input(path: &Path) -> Result<Vec<u8>, String> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("error reading stdin: {}", e))?;
        return Ok(buf);
    }
    std::fs::read(path).map_err(|e| format!("input file not found: {}: {}", path.display(), e))
}

fn render(bytes: &[u8], pretty: bool) -> Result<String, String> {
    if pretty {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| format!("expanded output is not JSON: {}", e))?;
        return serde_json::to_string_pretty(&value)
            .map_err(|e| format!("serialization error: {}", e));
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| format!("expanded output is not UTF-8: {}", e))
}

fn report_expand_errors(errors: &ExpandErrors, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            eprintln!("warning: expansion incomplete, {}", errors);
        }
        OutputFormat::Json => {
            let list: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            let json = serde_json::json!({ "errors": list });
            eprintln!("{}", serde_json::to_string(&json).unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_parsed() {
        let ctx = build_context(
            &["Authorization: Bearer abc".to_string(), "X-Trace:42".to_string()],
            Some(300),
        )
        .unwrap();
        assert_eq!(
            ctx.headers,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Trace".to_string(), "42".to_string()),
            ]
        );
        assert_eq!(ctx.timeout, Some(Duration::from_millis(300)));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(build_context(&["no-colon".to_string()], None).is_err());
        assert!(build_context(&[": value".to_string()], None).is_err());
    }

    #[test]
    fn render_pretty_and_raw() {
        assert_eq!(render(b"{\"a\":1}", false).unwrap(), "{\"a\":1}");
        assert_eq!(render(b"{\"a\":1}", true).unwrap(), "{\n  \"a\": 1\n}");
    }
}
