/*!

# Quick start

This example runs a poll end to end from the command line. We would like to find a date
for a team dinner in January 2026. The first two days of the month are holidays.

**Checking the candidate dates** Without a configuration file, `dpoll` uses January 2026
with the 1st and the 2nd as holidays:

```bash
dpoll dates
```

```text
2026-01-05 Monday
2026-01-06 Tuesday
2026-01-07 Wednesday
...
2026-01-30 Friday
```

**Voting** Each participant picks up to 3 dates:

```bash
dpoll submit --name Alice --date 2026-01-05 --date 2026-01-06
dpoll submit --name Bob --date 2026-01-06
```

Submitting again with the same name replaces the previous choice. To change a single date
of a previous submission, use `toggle`:

```bash
dpoll toggle --name Bob --date 2026-01-09
```

**Getting the results**

```bash
dpoll report
```

```text
Dinner Survey: January 2026 (2 participants)
Rank #1  2026-01-06  2 votes
Rank #2  2026-01-05  1 votes
Rank #3  2026-01-09  1 votes

2026-01-05 Monday      1  Alice
2026-01-06 Tuesday     2  Alice, Bob
...
```

**Cleaning up** The `admin` commands manage the data file. They need the shared password:

```bash
dpoll admin --password admin list
dpoll admin --password admin delete --name Bob
dpoll admin --password admin export --out submissions.csv
dpoll admin --password admin clear
```

It is the end of this quick start. The [manual](../manual/index.html) describes the data
file and the configuration options.

*/
