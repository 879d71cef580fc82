//! In-memory stand-ins for the host: account database, command runner and
//! operator. The runner and the database share state so that `useradd`
//! makes an account visible to later lookups, as on a real system.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use adminswap::{
    Account, AccountDatabase, AdminSwapError, CommandArgs, CommandOutput, CommandRunner, Prompter,
    Result,
};

#[derive(Debug, Default)]
pub struct FakeState {
    pub accounts: BTreeMap<String, Account>,
    /// Answers to successive `who` calls: true = the watched user is logged in
    pub sessions: VecDeque<bool>,
    pub session_user: String,
    /// Every command line run, in order
    pub commands: Vec<String>,
    /// Canned results by program name
    pub results: HashMap<&'static str, CommandOutput>,
    pub dry_run: bool,
    pub home_root: PathBuf,
}

/// A scratch host rooted in a temporary directory.
pub struct Fixture {
    pub state: Rc<RefCell<FakeState>>,
    pub root: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let state = FakeState {
            home_root: root.path().to_path_buf(),
            ..FakeState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            root,
        }
    }

    /// Fixture with an existing `ubuntu` account and its home directory.
    pub fn with_ubuntu() -> Self {
        let fixture = Self::new();
        fixture.add_account("ubuntu");
        fixture
    }

    pub fn home(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    pub fn add_account(&self, name: &str) -> Account {
        let account = make_account(&self.home(name), name);
        std::fs::create_dir_all(&account.home).expect("create home");
        self.state
            .borrow_mut()
            .accounts
            .insert(name.to_string(), account.clone());
        account
    }

    /// Put an `authorized_keys` file in `name`'s `~/.ssh`.
    pub fn add_ssh_keys(&self, name: &str, keys: &str) {
        let ssh = self.home(name).join(".ssh");
        std::fs::create_dir_all(&ssh).expect("create .ssh");
        std::fs::write(ssh.join("authorized_keys"), keys).expect("write keys");
    }

    /// `who` will report `user` as logged in for each `true`, then idle.
    pub fn script_sessions(&self, user: &str, sessions: &[bool]) {
        let mut state = self.state.borrow_mut();
        state.session_user = user.to_string();
        state.sessions = sessions.iter().copied().collect();
    }

    pub fn fail(&self, program: &'static str, output: CommandOutput) {
        self.state.borrow_mut().results.insert(program, output);
    }

    pub fn set_dry_run(&self, dry_run: bool) {
        self.state.borrow_mut().dry_run = dry_run;
    }

    pub fn runner(&self) -> FakeRunner {
        FakeRunner(Rc::clone(&self.state))
    }

    pub fn accounts(&self) -> FakeAccounts {
        FakeAccounts(Rc::clone(&self.state))
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn ran(&self, program: &str) -> bool {
        self.count(program) > 0
    }

    pub fn count(&self, program: &str) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(program))
            .count()
    }

    pub fn has_account(&self, name: &str) -> bool {
        self.state.borrow().accounts.contains_key(name)
    }
}

fn make_account(home: &Path, name: &str) -> Account {
    Account {
        name: name.to_string(),
        uid: nix::unistd::getuid().as_raw(),
        gid: nix::unistd::getgid().as_raw(),
        home: home.to_path_buf(),
    }
}

pub struct FakeRunner(Rc<RefCell<FakeState>>);

impl CommandRunner for FakeRunner {
    fn run(&mut self, args: &dyn CommandArgs) -> Result<CommandOutput> {
        let mut state = self.0.borrow_mut();
        state.commands.push(args.display());

        if state.dry_run && args.is_destructive() {
            return Ok(CommandOutput::ok(""));
        }
        if let Some(output) = state.results.get(args.program()) {
            return Ok(output.clone());
        }

        let cli = args.to_cli_args();
        let target = cli.last().cloned().unwrap_or_default();
        match args.program() {
            "who" => {
                let logged_in = state.sessions.pop_front().unwrap_or(false);
                let stdout = if logged_in {
                    format!("{}   pts/0   2026-10-19 09:12 (203.0.113.7)\n", state.session_user)
                } else {
                    "operator pts/1   2026-10-19 09:40 (198.51.100.4)\n".to_string()
                };
                Ok(CommandOutput::ok(stdout))
            }
            "useradd" => {
                let account = make_account(&state.home_root.join(&target), &target);
                std::fs::create_dir_all(&account.home)?;
                state.accounts.insert(target, account);
                Ok(CommandOutput::ok(""))
            }
            "deluser" | "userdel" => {
                state.accounts.remove(&target);
                Ok(CommandOutput::ok(""))
            }
            _ => Ok(CommandOutput::ok("")),
        }
    }

    fn is_dry_run(&self) -> bool {
        self.0.borrow().dry_run
    }
}

pub struct FakeAccounts(Rc<RefCell<FakeState>>);

impl AccountDatabase for FakeAccounts {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        Ok(self.0.borrow().accounts.get(name).cloned())
    }
}

/// Operator that answers from a script and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }

    pub fn unanswered(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.transcript.push(question.to_string());
        self.answers.pop_front().ok_or(AdminSwapError::InputClosed)
    }

    fn say(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }
}
