use clap::Parser;
use claimbook::cli::{
    AccidentCommand, ApartmentCommand, CheckpointCommand, ClientCommand, Cli, Command,
    PolicyCommand, QueryCommand,
};
use claimbook::config::Config;
use claimbook::error::{Error, Result};
use claimbook::logging;
use claimbook::model::{
    AccidentPatch, Apartment, ApartmentPatch, Client, ClientPatch, NewAccident, Policy,
    PolicyPatch,
};
use claimbook::report::{self, table};
use claimbook::store::Store;

fn not_found(table: &'static str, key: impl ToString) -> Error {
    Error::RecordNotFound { table, key: key.to_string() }
}

fn run_client(store: &Store, command: ClientCommand) -> Result<()> {
    match command {
        ClientCommand::Add(args) => {
            store.create_client(&Client {
                cpf: args.cpf.clone(),
                name: args.name,
                contact: args.contact,
                birth_date: args.birth_date,
                sex: args.sex,
            })?;
            println!("Client {} added.", args.cpf);
        }
        ClientCommand::Show { cpf, output } => {
            let client = store.get_client(&cpf)?.ok_or_else(|| not_found("clients", &cpf))?;
            report::print_record(&client, output.json, table::clients);
        }
        ClientCommand::Update(args) => {
            let patch = ClientPatch {
                name: args.name,
                contact: args.contact,
                birth_date: args.birth_date,
                sex: args.sex,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            store.update_client(&args.cpf, &patch)?;
            println!("Client {} updated.", args.cpf);
        }
        ClientCommand::Remove { cpf } => {
            store.delete_client(&cpf)?;
            println!("Client {cpf} removed.");
        }
        ClientCommand::List(output) => {
            report::print(&store.list_clients()?, output.json, table::clients);
        }
    }
    Ok(())
}

fn run_policy(store: &Store, command: PolicyCommand) -> Result<()> {
    match command {
        PolicyCommand::Add(args) => {
            store.create_policy(&Policy {
                policy_number: args.policy_number.clone(),
                start_date: args.start_date,
                monthly_value: args.monthly_value,
                coverage: args.coverage,
                client_cpf: args.client,
            })?;
            println!("Policy {} added.", args.policy_number);
        }
        PolicyCommand::Show { policy_number, output } => {
            let policy = store
                .get_policy(&policy_number)?
                .ok_or_else(|| not_found("policies", &policy_number))?;
            report::print_record(&policy, output.json, table::policies);
        }
        PolicyCommand::Update(args) => {
            let patch = PolicyPatch {
                start_date: args.start_date,
                monthly_value: args.monthly_value,
                coverage: args.coverage,
                client_cpf: args.client,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            store.update_policy(&args.policy_number, &patch)?;
            println!("Policy {} updated.", args.policy_number);
        }
        PolicyCommand::Remove { policy_number } => {
            store.delete_policy(&policy_number)?;
            println!("Policy {policy_number} removed.");
        }
        PolicyCommand::List(output) => {
            report::print(&store.list_policies()?, output.json, table::policies);
        }
    }
    Ok(())
}

fn run_apartment(store: &Store, command: ApartmentCommand) -> Result<()> {
    match command {
        ApartmentCommand::Add(args) => {
            store.create_apartment(&Apartment {
                address: args.address.clone(),
                city: args.city,
                area: args.area,
                policy_number: args.policy,
                market_value: args.market_value,
                residents: args.residents,
            })?;
            println!("Apartment '{}' added.", args.address);
        }
        ApartmentCommand::Show { address, output } => {
            let apartment = store
                .get_apartment(&address)?
                .ok_or_else(|| not_found("apartments", &address))?;
            report::print_record(&apartment, output.json, table::apartments);
        }
        ApartmentCommand::Update(args) => {
            let patch = ApartmentPatch {
                city: args.city,
                area: args.area,
                policy_number: args.policy,
                market_value: args.market_value,
                residents: args.residents,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            store.update_apartment(&args.address, &patch)?;
            println!("Apartment '{}' updated.", args.address);
        }
        ApartmentCommand::Remove { address } => {
            store.delete_apartment(&address)?;
            println!("Apartment '{address}' removed.");
        }
        ApartmentCommand::List(output) => {
            report::print(&store.list_apartments()?, output.json, table::apartments);
        }
    }
    Ok(())
}

fn run_accident(store: &Store, command: AccidentCommand) -> Result<()> {
    match command {
        AccidentCommand::Add(args) => {
            let id = store.create_accident(&NewAccident {
                accident_id: args.id,
                date: args.date,
                accident_count: args.count,
                apartment_address: args.apartment,
                description: args.description,
                involved: args.involved,
            })?;
            println!("Accident {id} recorded.");
        }
        AccidentCommand::Show { accident_id, output } => {
            let accident = store
                .get_accident(accident_id)?
                .ok_or_else(|| not_found("accidents", accident_id))?;
            report::print_record(&accident, output.json, table::accidents);
        }
        AccidentCommand::Update(args) => {
            let patch = AccidentPatch {
                date: args.date,
                accident_count: args.count,
                apartment_address: args.apartment,
                description: args.description,
                involved: args.involved,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            store.update_accident(args.accident_id, &patch)?;
            println!("Accident {} updated.", args.accident_id);
        }
        AccidentCommand::Remove { accident_id } => {
            store.delete_accident(accident_id)?;
            println!("Accident {accident_id} removed.");
        }
        AccidentCommand::List(output) => {
            report::print(&store.list_accidents()?, output.json, table::accidents);
        }
    }
    Ok(())
}

fn run_checkpoint(store: &mut Store, command: CheckpointCommand) -> Result<()> {
    match command {
        CheckpointCommand::Save { name } => {
            let info = store.capture_checkpoint(&name)?;
            println!("Checkpoint '{}' saved ({} rows).", info.name, info.counts.total());
        }
        CheckpointCommand::Restore { name } => {
            let info = store.restore_checkpoint(&name)?;
            println!(
                "Restored '{}' from {}: {} clients, {} policies, {} apartments, {} accidents.",
                info.name,
                report::format_timestamp(info.created_at),
                info.counts.clients,
                info.counts.policies,
                info.counts.apartments,
                info.counts.accidents
            );
        }
        CheckpointCommand::Show { name, output } => {
            let doc = store.load_checkpoint(&name)?;
            report::print_record(&doc, output.json, table::checkpoint_document);
        }
        CheckpointCommand::List(output) => {
            report::print(&store.list_checkpoints()?, output.json, table::checkpoints);
        }
    }
    Ok(())
}

fn run_query(store: &Store, command: QueryCommand) -> Result<()> {
    match command {
        QueryCommand::PoliciesWithClients(output) => {
            report::print(&store.policies_with_clients()?, output.json, table::policies_with_clients);
        }
        QueryCommand::ApartmentsPerCity(output) => {
            report::print(&store.apartments_per_city()?, output.json, table::city_counts);
        }
        QueryCommand::PoliciesAbove { min, output } => {
            report::print(&store.policies_above(min)?, output.json, table::policies);
        }
        QueryCommand::ClientsWithoutPolicies(output) => {
            report::print(&store.clients_without_policies()?, output.json, table::clients);
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(&cli)?;
    logging::init(&config)?;

    // one connection per invocation, dropped on every exit path
    let mut store = Store::open(&config)?;

    match cli.command {
        Command::Init => {
            match store.path() {
                Some(path) => println!("Database ready at {}", path.display()),
                None => println!("Database ready (in memory)"),
            }
            Ok(())
        }
        Command::Client(command) => run_client(&store, command),
        Command::Policy(command) => run_policy(&store, command),
        Command::Apartment(command) => run_apartment(&store, command),
        Command::Accident(command) => run_accident(&store, command),
        Command::Checkpoint(command) => run_checkpoint(&mut store, command),
        Command::Query(command) => run_query(&store, command),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
