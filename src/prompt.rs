//! Renders the instruction and context bundle into the payload text
//! sent to the rewriting agent.
//!
//! Both modes share one block format and state the reply grammar
//! verbatim, so extraction can rely on it: a `FILE: <name>` marker
//! line immediately before each file's full content, no markdown
//! fences, no prose outside file bodies.

use crate::context::ContextBundle;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub enum PromptMode<'a> {
    /// One file is the rewrite subject; the bundle (subject first) is
    /// framed as current code context.
    SingleTarget { target: &'a Path },
    /// Every file in the bundle is a rewrite subject.
    Batch { entry: &'a Path },
}

const SECURITY_DIRECTIVES: &str = "\
Add the following security features as appropriate:
1. Network ACLs with strict inbound/outbound rules
2. Flow logs for VPC traffic monitoring to CloudWatch
3. Security Group enhancements with least privilege access
4. Encryption for S3 endpoints and any other relevant services
5. VPC Endpoint policies with proper restrictions";

const REPLY_GRAMMAR: &str = "\
IMPORTANT: Format your response as follows:
- For each file you modify, include the filename preceded by \"FILE: \"
- Example: \"FILE: main.tf\"
- Then provide the complete file content with your security enhancements
- DO NOT include markdown code block markers
- DO NOT include any explanatory text outside the actual code
- Include ALL necessary code for each file, not just the changes
- The content must be valid Terraform syntax that can be directly saved to .tf files";

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn compose(mode: &PromptMode, bundle: &ContextBundle) -> String {
    let header = match mode {
        PromptMode::SingleTarget { target } => format!(
            "You are a Terraform expert. Update the following Terraform file to add security configurations:\n{}",
            basename(target)
        ),
        PromptMode::Batch { entry } => format!(
            "You are a Terraform expert. Update the VPC configuration in {} and the files it depends on to add security configurations.",
            basename(entry)
        ),
    };

    format!(
        "{header}\n\n{SECURITY_DIRECTIVES}\n\n{REPLY_GRAMMAR}\n\n\
Only modify AWS resources, keeping the existing structure and module usage patterns.\n\n\
Current code context:\n{}",
        bundle.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextSection;
    use std::path::PathBuf;

    fn bundle_with(path: &str, content: &str) -> ContextBundle {
        ContextBundle {
            sections: vec![ContextSection {
                path: PathBuf::from(path),
                content: content.to_string(),
            }],
            token_count: 10,
            files_included: 1,
        }
    }

    #[test]
    fn test_prompt_states_reply_grammar() {
        let bundle = bundle_with("/repo/main.tf", "module \"vpc\" {}");
        let target = PathBuf::from("/repo/main.tf");
        let prompt = compose(&PromptMode::SingleTarget { target: &target }, &bundle);

        assert!(prompt.contains("FILE: main.tf"));
        assert!(prompt.contains("DO NOT include markdown code block markers"));
        assert!(prompt.contains("preceded by \"FILE: \""));
    }

    #[test]
    fn test_prompt_includes_context_blocks() {
        let bundle = bundle_with("/repo/main.tf", "module \"vpc\" {}");
        let entry = PathBuf::from("/repo/main.tf");
        let prompt = compose(&PromptMode::Batch { entry: &entry }, &bundle);

        assert!(prompt.contains("Current code context:"));
        assert!(prompt.contains("FILE: /repo/main.tf\nmodule \"vpc\" {}"));
    }

    #[test]
    fn test_modes_differ_only_in_header() {
        let bundle = bundle_with("/repo/main.tf", "module \"vpc\" {}");
        let path = PathBuf::from("/repo/main.tf");
        let single = compose(&PromptMode::SingleTarget { target: &path }, &bundle);
        let batch = compose(&PromptMode::Batch { entry: &path }, &bundle);

        assert_ne!(single, batch);
        assert!(single.contains("Update the following Terraform file"));
        assert!(batch.contains("Update the VPC configuration"));
        for prompt in [&single, &batch] {
            assert!(prompt.contains("Network ACLs"));
            assert!(prompt.contains("Current code context:"));
        }
    }
}
