use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use git2::{Repository, RepositoryInitOptions, Signature, Time};
use qkpr::branch::{describe_branches, BranchPresentation, SectionKind};
use qkpr::cli::prompt::Prompter;
use qkpr::cli::{Commands, Session};
use qkpr::config::{PreferenceStore, PromptLanguage};
use qkpr::git::GitRepository;
use qkpr::pr::PullRequestDraft;
use tempfile::TempDir;

/// Temporary repository with a `main` branch, driven through git2.
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&repo_path, &opts)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(Self {
            _temp_dir: temp_dir,
            repo_path,
            repo,
        })
    }

    fn stage(&self, file: &str, content: &str) -> Result<()> {
        fs::write(self.repo_path.join(file), content)?;
        let mut index = self.repo.index()?;
        index.add_path(Path::new(file))?;
        index.write()?;
        Ok(())
    }

    /// Commits the index onto `branch`, parented on its current tip or on `base`.
    fn commit_on(&self, branch: &str, base: Option<&str>, message: &str) -> Result<git2::Oid> {
        let reference = format!("refs/heads/{branch}");
        let parent = match self.repo.find_reference(&reference) {
            Ok(r) => Some(r.peel_to_commit()?),
            Err(_) => match base {
                Some(base) => Some(self.repo.find_reference(&format!("refs/heads/{base}"))?.peel_to_commit()?),
                None => None,
            },
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let signature = Signature::now("Test User", "test@example.com")?;
        let tree_id = self.repo.index()?.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        Ok(self
            .repo
            .commit(Some(&reference), &signature, &signature, message, &tree, &parents)?)
    }

    fn add_commit(&self, branch: &str, base: Option<&str>, file: &str, message: &str) -> Result<()> {
        self.stage(file, message)?;
        self.commit_on(branch, base, message)?;
        Ok(())
    }

    /// Commits HEAD's tree onto an arbitrary reference with a fixed commit time.
    fn commit_at(&self, reference: &str, message: &str, epoch_seconds: i64) -> Result<git2::Oid> {
        let head = self.repo.head()?.peel_to_commit()?;
        let signature = Signature::new("Test User", "test@example.com", &Time::new(epoch_seconds, 0))?;
        Ok(self.repo.commit(
            Some(reference),
            &signature,
            &signature,
            message,
            &head.tree()?,
            &[&head],
        )?)
    }

    /// Makes the index match `branch`, leaving nothing staged.
    fn reset_index_to(&self, branch: &str) -> Result<()> {
        let tree = self
            .repo
            .find_reference(&format!("refs/heads/{branch}"))?
            .peel_to_tree()?;
        let mut index = self.repo.index()?;
        index.read_tree(&tree)?;
        index.write()?;
        Ok(())
    }

    fn set_origin(&self, url: &str) -> Result<()> {
        self.repo.remote("origin", url)?;
        Ok(())
    }

    fn git(&self) -> GitRepository {
        GitRepository::open_at(&self.repo_path)
    }
}

/// `main` with one commit plus `feature/login` and `fix/typo` on top of it.
fn repo_with_branches() -> Result<TestRepo> {
    let repo = TestRepo::new()?;
    repo.add_commit("main", None, "README.md", "chore: initial commit")?;
    repo.add_commit("feature/login", Some("main"), "login.rs", "feat: add login form")?;
    repo.add_commit("feature/login", None, "session.rs", "feat: keep session")?;
    repo.add_commit("fix/typo", Some("main"), "typo.txt", "fix: typo in docs")?;
    repo.reset_index_to("main")?;
    Ok(repo)
}

#[tokio::test]
async fn reads_repository_info() -> Result<()> {
    let repo = repo_with_branches()?;
    let git = repo.git();

    assert!(git.is_repository().await);
    assert!(!git.info().await.is_git_repository, "no origin yet");

    repo.set_origin("git@github.com:octo/app.git")?;
    let info = git.info().await;
    assert!(info.is_git_repository);
    assert_eq!(info.current_branch, "main");
    assert_eq!(info.remote_url, "git@github.com:octo/app.git");
    Ok(())
}

#[tokio::test]
async fn lists_and_describes_branches() -> Result<()> {
    let repo = repo_with_branches()?;
    let git = repo.git();

    let branches = git.list_branches().await;
    assert_eq!(branches, vec!["feature/login", "fix/typo", "main"]);

    let now = Utc::now();
    let timestamp = git.last_commit_timestamp("main").await.expect("main has commits");
    assert!((now.timestamp() - timestamp).abs() < 600);
    assert_eq!(git.last_commit_timestamp("nope").await, None);

    let descriptors = describe_branches(&git, &branches, now).await;
    assert_eq!(descriptors.len(), 3);
    assert!(descriptors.iter().all(|d| d.last_commit_epoch_seconds > 0));
    assert_eq!(descriptors[0].category, "feature");
    assert_eq!(descriptors[2].category, "other");

    let presentation = BranchPresentation::category_view(descriptors, &["fix/typo".to_string()]);
    let first = &presentation.sections()[0];
    assert_eq!(first.kind, SectionKind::Pinned);
    assert_eq!(first.branches[0].name, "fix/typo");
    assert_eq!(presentation.len(), 3);
    Ok(())
}

#[tokio::test]
async fn commit_time_prefers_origin_ref() -> Result<()> {
    const REMOTE_TIME: i64 = 1_600_000_000;
    const LOCAL_ONLY_TIME: i64 = 1_500_000_000;

    let repo = repo_with_branches()?;
    repo.commit_at("refs/remotes/origin/main", "chore: pushed elsewhere", REMOTE_TIME)?;
    repo.commit_at("refs/heads/legacy/import", "chore: old import", LOCAL_ONLY_TIME)?;
    let git = repo.git();

    let local_main = repo.repo.find_reference("refs/heads/main")?.peel_to_commit()?.time().seconds();
    assert_ne!(local_main, REMOTE_TIME);
    assert_eq!(git.last_commit_timestamp("main").await, Some(REMOTE_TIME));
    assert_eq!(git.last_commit_timestamp("legacy/import").await, Some(LOCAL_ONLY_TIME));

    let branches = git.list_branches().await;
    assert_eq!(branches.iter().filter(|b| *b == "main").count(), 1);
    Ok(())
}

#[tokio::test]
async fn lists_commits_unique_to_source() -> Result<()> {
    let repo = repo_with_branches()?;
    let git = repo.git();

    let lines = git.commit_subjects_between("main", "feature/login").await;
    assert_eq!(lines, vec!["- feat: keep session", "- feat: add login form"]);
    assert!(git.commit_subjects_between("main", "missing").await.is_empty());
    Ok(())
}

#[tokio::test]
async fn builds_pull_request_draft() -> Result<()> {
    let repo = repo_with_branches()?;
    repo.set_origin("https://gitlab.example.com/group/app.git")?;
    let git = repo.git();

    let draft = PullRequestDraft::build(
        &git,
        "https://gitlab.example.com/group/app.git",
        "feature/login",
        "main",
        PromptLanguage::En,
    )
    .await?;

    assert_eq!(
        draft.url,
        "https://gitlab.example.com/group/app/merge_requests/new?merge_request%5Bsource_branch%5D=feature%2Flogin&merge_request%5Btarget_branch%5D=main"
    );
    assert!(draft.message.starts_with("### 🔧 PR: `feature/login` → `main`"));
    assert!(draft.message.contains("- feat: add login form"));
    assert_eq!(draft.suggested_merge_branch_name, "merge/feature-login-to-main");
    Ok(())
}

#[tokio::test]
async fn draft_rejects_unknown_remote_form() -> Result<()> {
    let repo = repo_with_branches()?;
    let result = PullRequestDraft::build(
        &repo.git(),
        "file:///srv/app.git",
        "feature/login",
        "main",
        PromptLanguage::Zh,
    )
    .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn detects_staged_changes() -> Result<()> {
    let repo = repo_with_branches()?;
    let git = repo.git();
    assert!(!git.has_staged_changes().await);

    repo.stage("notes.md", "remember the milk\n")?;
    assert!(git.has_staged_changes().await);
    let diff = git.staged_diff().await?;
    assert!(diff.contains("notes.md"));
    assert!(diff.contains("+remember the milk"));
    Ok(())
}

#[tokio::test]
async fn pin_command_persists_across_sessions() -> Result<()> {
    let repo = repo_with_branches()?;
    let config = repo.repo_path.join(".qkpr-test.json");

    let mut session = Session::new(
        PreferenceStore::at(&config),
        repo.git(),
        Prompter::new(Cursor::new(Vec::new()), Vec::new()),
    );
    Commands::Pin {
        branch: Some("fix/typo".into()),
    }
    .run(&mut session)
    .await?;
    Commands::Pinned.run(&mut session).await?;

    let output = String::from_utf8(session.prompter.into_output())?;
    assert!(output.contains("Branch 'fix/typo' has been pinned"));
    assert_eq!(PreferenceStore::at(&config).pinned_branches(), vec!["fix/typo"]);
    Ok(())
}
