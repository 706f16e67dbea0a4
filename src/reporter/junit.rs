//! JUnit XML rendering. Ported from the JUnit writer's escaping and
//! structure rules in spec.md §4.9: `.` in class/suite names becomes `_`,
//! failure bodies are CDATA-wrapped with the standard `]]>`-inside-CDATA
//! escape, and unsupported tests emit a `<skipped>` element instead of a
//! `<failure>`.

use crate::test::{ResultCode, Test, TestResult};

fn sanitize_name(name: &str) -> String {
    name.replace('.', "_")
}

fn escape_cdata(body: &str) -> String {
    body.replace("]]>", "]]]]><![CDATA[>")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}

struct SuiteGroup<'a> {
    name: String,
    tests: Vec<&'a (Test, TestResult)>,
}

pub fn render_junit(results: &[(Test, TestResult)]) -> String {
    let mut suite_order: Vec<String> = Vec::new();
    let mut suites: std::collections::HashMap<String, SuiteGroup> = std::collections::HashMap::new();
    for pair in results {
        let (test, _) = pair;
        let name = test.suite.name.clone();
        if !suites.contains_key(&name) {
            suite_order.push(name.clone());
            suites.insert(name.clone(), SuiteGroup { name: name.clone(), tests: Vec::new() });
        }
        suites.get_mut(&name).unwrap().tests.push(pair);
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites>\n");
    for suite_name in &suite_order {
        let group = &suites[suite_name];
        let total = group.tests.len();
        let failures = group.tests.iter().filter(|(_, r)| r.code.is_failure()).count();
        let skipped = group.tests.iter().filter(|(_, r)| r.code == ResultCode::Unsupported).count();
        out.push_str(&format!(
            "  <testsuite name=\"{}\" tests=\"{total}\" failures=\"{failures}\" skipped=\"{skipped}\">\n",
            escape_attr(&sanitize_name(&group.name))
        ));
        for (test, result) in &group.tests {
            let classname = sanitize_name(&group.name);
            let testname = sanitize_name(&test.path_in_suite.join("/"));
            let time = result.elapsed.unwrap_or(0.0);
            out.push_str(&format!(
                "    <testcase classname=\"{}\" name=\"{}\" time=\"{:.3}\">\n",
                escape_attr(&classname),
                escape_attr(&testname),
                time
            ));
            match result.code {
                ResultCode::Unsupported => {
                    out.push_str(&format!("      <skipped message=\"{}\" />\n", escape_attr(&result.output)));
                }
                code if code.is_failure() => {
                    out.push_str("      <failure><![CDATA[");
                    out.push_str(&escape_cdata(&result.output));
                    out.push_str("]]></failure>\n");
                }
                _ => {}
            }
            out.push_str("    </testcase>\n");
        }
        out.push_str("  </testsuite>\n");
    }
    out.push_str("</testsuites>\n");
    out
}
